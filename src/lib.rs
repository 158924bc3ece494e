//! Alphadash core crate.
//!
//! Implemented scope:
//! - closed-form points estimate from daily trading volume
//! - polling token feed state machine with a filter/sort/paginate view
//! - fixed-endpoint token list client and display formatting helpers

mod feed;
mod format;
mod observability;
mod points;
mod token_list;

pub use feed::{
    FeedConfig, FeedPage, FeedTask, SortConfig, SortDirection, SortKey, TokenFeed,
    COUNTDOWN_SECONDS, PAGE_SIZE,
};
pub use format::{format_percent, format_price, percent_is_loss};
pub use observability::{
    init_logging, log_app_start, log_feed_started, logging_config_from_env, LogFormat,
    LoggingConfig, LoggingInitError,
};
pub use points::{calculate, parse_multiplier, CalculationResult, Multiplier, PointsError};
pub use token_list::{
    tokens_from_envelope, FeedError, Token, TokenListClient, TokenListEnvelope, TokenListSource,
    DEFAULT_TOKEN_LIST_URL,
};
