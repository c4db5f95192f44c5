//! Popularity-blended matrix factorization recommender.

pub mod bias;
pub mod diversity;
pub mod index;
pub mod math;
pub mod model;
pub mod opts;
pub mod prelude;
pub mod rating;
pub mod scorer;
pub mod trainer;
