use std::borrow::Cow;

use sentry::integrations::tracing::EventFilter;
use sentry::{ClientInitGuard, ClientOptions};
use svd_recommender::prelude::*;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Initialises tracing: human-readable events go to stderr, leaving stdout to the recommendations.
///
/// The Sentry layer is only installed when a DSN is configured.
pub fn init(sentry_dsn: Option<String>, traces_sample_rate: f32) -> Result<ClientInitGuard> {
    let guard = sentry::init((
        sentry_dsn,
        ClientOptions {
            release: Some(Cow::Borrowed(env!("CARGO_PKG_VERSION"))),
            traces_sample_rate,
            ..Default::default()
        },
    ));

    let sentry_layer = if guard.is_enabled() {
        let filter = env_filter("SVD_RECOMMENDER_SENTRY_LOG", "svd_recommender=debug")?;
        let layer = sentry::integrations::tracing::layer()
            .event_filter(|metadata| match *metadata.level() {
                Level::ERROR | Level::WARN => EventFilter::Event,
                _ => EventFilter::Breadcrumb,
            })
            // Training spans: `train`, `factorize` and friends are all `info`.
            .span_filter(|metadata| *metadata.level() <= Level::INFO)
            .with_filter(filter);
        Some(layer)
    } else {
        None
    };

    let format_layer = tracing_subscriber::fmt::layer()
        .without_time()
        .with_writer(std::io::stderr)
        .with_filter(env_filter("SVD_RECOMMENDER_LOG", "svd_recommender=info")?);

    tracing_subscriber::Registry::default()
        .with(sentry_layer)
        .with(format_layer)
        .init();

    Ok(guard)
}

/// Reads the filter directives from the variable, falling back to the default ones.
fn env_filter(variable: &str, default: &str) -> Result<EnvFilter> {
    let filter = EnvFilter::try_from_env(variable).or_else(|_| EnvFilter::try_new(default))?;
    Ok(filter)
}
