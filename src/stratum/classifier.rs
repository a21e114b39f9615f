use super::{MINING_AUTHORIZE, MINING_NOTIFY, MINING_SET_DIFFICULTY, MINING_SUBMIT, MINING_SUBSCRIBE};

/// Bitmask of Stratum message kinds observed in a single line.
///
/// Classification is additive: a buffer naming several methods (e.g. a
/// pool's initial subscribe reply, which embeds both `mining.set_difficulty`
/// and `mining.notify`) carries the sum of their bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StratumKind(u8);

impl StratumKind {
    pub const ACK: StratumKind = StratumKind(0);
    pub const SUBSCRIBE: StratumKind = StratumKind(1);
    pub const AUTH: StratumKind = StratumKind(2);
    pub const SET_DIFFICULTY: StratumKind = StratumKind(4);
    pub const NOTIFY: StratumKind = StratumKind(8);
    pub const SUBMIT: StratumKind = StratumKind(16);
    /// A server's initial subscribe response, which carries both a
    /// difficulty and the first job notification in one payload.
    pub const INIT_SUBSCRIBE: StratumKind = StratumKind(Self::SET_DIFFICULTY.0 | Self::NOTIFY.0);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: StratumKind) -> bool {
        other.0 == 0 || (self.0 & other.0) == other.0
    }
}

impl std::ops::BitOr for StratumKind {
    type Output = StratumKind;
    fn bitor(self, rhs: StratumKind) -> StratumKind {
        StratumKind(self.0 | rhs.0)
    }
}

/// Classifies a raw line by substring presence of the five Stratum method
/// names. Matching is plain, case-sensitive substring search; no JSON
/// well-formedness validation is performed. Non-UTF-8 input classifies as
/// `ACK` rather than panicking.
pub fn classify(buf: &[u8]) -> StratumKind {
    let text = String::from_utf8_lossy(buf);
    let mut kind = StratumKind::ACK;
    if text.contains(MINING_SUBSCRIBE) {
        kind = kind | StratumKind::SUBSCRIBE;
    }
    if text.contains(MINING_AUTHORIZE) {
        kind = kind | StratumKind::AUTH;
    }
    if text.contains(MINING_SUBMIT) {
        kind = kind | StratumKind::SUBMIT;
    }
    if text.contains(MINING_SET_DIFFICULTY) {
        kind = kind | StratumKind::SET_DIFFICULTY;
    }
    if text.contains(MINING_NOTIFY) {
        kind = kind | StratumKind::NOTIFY;
    }
    kind
}
