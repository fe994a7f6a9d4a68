//! Vote toggling shared by threads and comments.
//!
//! For a given (subject, voter) pair exactly one of three states holds:
//! neutral, upvoted or downvoted. Casting the vote already held is rejected
//! without mutation; casting the opposite vote moves the voter between the
//! two sets. There is no unvote.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteKind {
    Up,
    Down,
}

impl VoteKind {
    /// "upvoted" / "downvoted", for error messages.
    pub fn past_tense(self) -> &'static str {
        match self {
            VoteKind::Up => "upvoted",
            VoteKind::Down => "downvoted",
        }
    }
}

/// The voter already holds this vote; the subject was left unchanged.
#[derive(Debug, PartialEq, Eq)]
pub struct AlreadyVoted;

/// Apply a vote to a subject's sets. Both removal from the opposite set and
/// insertion into the target set happen here, so the caller persists the
/// document in one write and the mutual-exclusion invariant never escapes.
pub fn cast(
    kind: VoteKind,
    upvotes: &mut Vec<String>,
    downvotes: &mut Vec<String>,
    voter: &str,
) -> Result<(), AlreadyVoted> {
    let (same, opposite) = match kind {
        VoteKind::Up => (upvotes, downvotes),
        VoteKind::Down => (downvotes, upvotes),
    };

    if same.iter().any(|id| id == voter) {
        return Err(AlreadyVoted);
    }

    opposite.retain(|id| id != voter);
    same.push(voter.to_string());
    Ok(())
}
