//! CLI options and commands.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use itertools::Itertools;
use svd_recommender::bias::UserItemBiasModel;
use svd_recommender::diversity::{intra_list_similarity, Average};
use svd_recommender::opts::TrainerOpts;
use svd_recommender::prelude::*;
use svd_recommender::rating::Rating;
use svd_recommender::scorer::Scorer;
use svd_recommender::trainer::{train, Cancellation};

#[derive(Parser)]
#[command(version, about)]
pub struct Opts {
    /// Sentry DSN
    #[arg(long, env = "SVD_RECOMMENDER_SENTRY_DSN")]
    pub sentry_dsn: Option<String>,

    /// Performance monitoring sample rate
    #[arg(long, default_value_t = 0.0, env = "SVD_RECOMMENDER_TRACES_SAMPLE_RATE")]
    pub traces_sample_rate: f32,

    #[command(subcommand)]
    pub subcommand: Command,
}

#[derive(Subcommand)]
pub enum Command {
    Recommend(RecommendOpts),
}

/// Trains the model and prints the top recommendations
#[derive(Args)]
pub struct RecommendOpts {
    /// Ratings file, one JSON object per line:
    /// {"user_id": 1, "item_id": 2, "value": 4.5}
    #[arg(short, long)]
    pub ratings: PathBuf,

    /// Users to recommend to, defaults to the first 10 rating users
    #[arg(short, long = "user")]
    pub users: Vec<UserId>,

    /// Number of recommendations per user
    #[arg(short, long, default_value_t = 10)]
    pub n: usize,

    /// Bias model damping
    #[arg(long, default_value_t = 5.0)]
    pub damping: f64,

    #[command(flatten)]
    pub trainer: TrainerOpts,
}

pub fn run(opts: Opts) -> Result {
    match opts.subcommand {
        Command::Recommend(opts) => recommend(opts),
    }
}

fn recommend(opts: RecommendOpts) -> Result {
    let hyperparameters = opts.trainer.validate()?;
    let ratings = read_ratings(&opts.ratings)?;
    let baseline = UserItemBiasModel::fit(&ratings, opts.damping)?;
    let model = train(&ratings, &baseline, hyperparameters, Cancellation::new())?;
    let scorer = Scorer::new(&model, &baseline);

    let mut similarity = Average::default();
    for (user_id, exclude) in select_users(&ratings, &opts.users) {
        let recommendations = scorer.recommend(user_id, opts.n, &exclude);
        if recommendations.is_empty() {
            warn!(user_id, "no recommendations");
            continue;
        }
        let item_ids = recommendations.iter().map(|(item_id, _)| *item_id).collect_vec();
        let user_similarity = intra_list_similarity(&model, &item_ids);
        similarity.push(user_similarity);

        println!("Recommendations for user #{} (ILS {:.4}):", user_id, user_similarity);
        for (item_id, score) in recommendations {
            println!(
                "  item #{:<8} score {:>7.3}  popularity {:>5.2}",
                item_id,
                score,
                model.popularity(item_id),
            );
        }
    }
    info!(n_users = similarity.count(), mean_ils = similarity.average(), "done");
    Ok(())
}

/// Picks each requested user once along with the items they already rated.
/// Without requested users, picks the first 10 users in the ratings.
fn select_users(ratings: &[Rating], requested: &[UserId]) -> Vec<(UserId, AHashSet<ItemId>)> {
    let mut rated_items = AHashMap::<UserId, AHashSet<ItemId>>::new();
    for rating in ratings {
        rated_items.entry(rating.user_id).or_default().insert(rating.item_id);
    }
    let users = if requested.is_empty() {
        ratings.iter().map(|rating| rating.user_id).unique().take(10).collect_vec()
    } else {
        requested.iter().copied().unique().collect_vec()
    };
    users
        .into_iter()
        .map(|user_id| (user_id, rated_items.get(&user_id).cloned().unwrap_or_default()))
        .collect()
}

#[instrument(level = "info", skip_all, fields(path = ?path))]
fn read_ratings(path: &Path) -> Result<Vec<Rating>> {
    let file = File::open(path).with_context(|| format!("failed to open `{}`", path.display()))?;
    let mut ratings = Vec::new();
    for (line_number, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let rating: Rating = serde_json::from_str(&line)
            .with_context(|| format!("invalid rating on line {}", line_number + 1))?;
        ratings.push(rating);
    }
    info!(n_ratings = ratings.len(), "loaded");
    Ok(ratings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratings() -> Vec<Rating> {
        vec![
            Rating::new(1, 10, 5.0),
            Rating::new(1, 20, 3.0),
            Rating::new(2, 20, 4.0),
            Rating::new(2, 30, 1.0),
            Rating::new(3, 30, 5.0),
        ]
    }

    #[test]
    fn select_repeated_user_ok() {
        let selected = select_users(&ratings(), &[1, 1]);
        assert_eq!(selected.len(), 1);
        let (user_id, exclude) = &selected[0];
        assert_eq!(*user_id, 1);
        assert_eq!(exclude, &AHashSet::from_iter([10, 20]));
    }

    #[test]
    fn select_keeps_exclusions_for_every_user_ok() {
        let selected = select_users(&ratings(), &[2, 1, 2, 4]);
        let user_ids = selected.iter().map(|(user_id, _)| *user_id).collect_vec();
        assert_eq!(user_ids, [2, 1, 4]);
        assert_eq!(selected[0].1, AHashSet::from_iter([20, 30]));
        assert_eq!(selected[1].1, AHashSet::from_iter([10, 20]));
        assert!(selected[2].1.is_empty());
    }

    #[test]
    fn select_default_users_ok() {
        let selected = select_users(&ratings(), &[]);
        let user_ids = selected.into_iter().map(|(user_id, _)| user_id).collect_vec();
        assert_eq!(user_ids, [1, 2, 3]);
    }
}
