/// Process-wide options, threaded explicitly into the engine and the
/// downstream processor rather than living as ambient globals.
///
/// Break length, banding and the extension/shadow/seq-end toggles belong to
/// the extension collaborator; the engine itself does not interpret them.
#[derive(Debug, Clone)]
pub struct PostConfig {
    /// Alignment break (give-up) length for extension
    pub break_len: u32,
    /// Diagonal banding for extension; 0 disables banding
    pub banding: u32,
    /// Extend alignments outward from clusters
    pub extend: bool,
    /// Force alignment to sequence ends when within break_len
    pub to_seq_end: bool,
    /// Keep shadowed alignments (self-alignment / repeat finding)
    pub keep_shadows: bool,
}

impl Default for PostConfig {
    fn default() -> Self {
        PostConfig {
            break_len: 200,
            banding: 0,
            extend: true,
            to_seq_end: false,
            keep_shadows: false,
        }
    }
}
