pub mod fallback;
pub mod neighbors;
pub mod profile;
pub mod recommendations;
pub mod similarity;

pub use neighbors::{top_neighbors, Neighbor};
pub use recommendations::{
    Recommendations, Recommender, RecommenderSettings, ResultOrder, ScoredItem, StrategyKind,
};
pub use similarity::jaccard;
