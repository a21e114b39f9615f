//! Substring-level classification and message templates for the Stratum
//! mining protocol, consumed as opaque line-oriented JSON. Only the five
//! method-name substrings below are ever recognized; this is not a general
//! Stratum parser.

pub mod classifier;
pub mod rewrite;
pub mod templates;

pub use classifier::{classify, StratumKind};
pub use rewrite::{extract_id, replace_id, rewrite_first_param};

pub const MINING_SUBSCRIBE: &str = "mining.subscribe";
pub const MINING_AUTHORIZE: &str = "mining.authorize";
pub const MINING_SUBMIT: &str = "mining.submit";
pub const MINING_SET_DIFFICULTY: &str = "mining.set_difficulty";
pub const MINING_NOTIFY: &str = "mining.notify";
