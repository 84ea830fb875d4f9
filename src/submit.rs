use crate::*;

use std::time::Duration;

/// Lifecycle of a single vote:
/// `Constructed -> Signed -> Submitted -> {Confirmed | Rejected | TimedOut}`.
///
/// The early transitions are enforced by types — only a [`SignedVote`]
/// (which only [`VotePayload::sign`] produces) can be submitted — so this
/// enum mostly names the terminal states. `TimedOut` means the outcome is
/// unknown; retrying is safe only after confirming the nullifier was not
/// accepted. `Rejected` means the ledger refused the vote and the same
/// payload must not be resubmitted.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteStatus {
    Constructed,
    Signed,
    Submitted,
    Confirmed,
    Rejected,
    TimedOut,
}

impl VoteStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            VoteStatus::Confirmed | VoteStatus::Rejected | VoteStatus::TimedOut
        )
    }
}

/// Result of one submission attempt. Always carries a terminal status;
/// the receipt is present only when the ledger produced one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub status: VoteStatus,
    pub receipt: Option<SubmissionReceipt>,
}

impl SubmissionOutcome {
    pub fn is_confirmed(&self) -> bool {
        self.status == VoteStatus::Confirmed
    }
}

/// Packages signed votes for the ledger and interprets receipts.
///
/// Every ledger-layer failure is converted into a terminal
/// [`SubmissionOutcome`] plus a logged diagnostic; nothing propagates past
/// this boundary.
pub struct VoteSubmitter {
    timeout: Duration,
}

impl VoteSubmitter {
    pub fn new(config: &VoterConfig) -> Self {
        VoteSubmitter {
            timeout: config.submission_timeout,
        }
    }

    /// Submit a signed vote and block until a receipt or the configured
    /// timeout. A transport failure leaves the outcome as unknown as a
    /// timeout does, so it also maps to `TimedOut`.
    pub fn submit<L: LedgerClient>(&self, vote: &SignedVote, ledger: &mut L) -> SubmissionOutcome {
        let request = CastVoteRequest::from_signed_vote(vote);
        tracing::debug!(
            candidate = request.candidate,
            nullifier = %vote.nullifier(),
            "submitting vote"
        );

        match ledger.cast_vote(&request, self.timeout) {
            Ok(receipt) => {
                let status = if receipt.success {
                    tracing::info!(transaction_id = %receipt.transaction_id, "vote confirmed");
                    VoteStatus::Confirmed
                } else {
                    tracing::warn!(transaction_id = %receipt.transaction_id, "vote rejected by receipt");
                    VoteStatus::Rejected
                };
                SubmissionOutcome {
                    status,
                    receipt: Some(receipt),
                }
            }
            Err(LedgerError::Rejected(reason)) => {
                tracing::warn!(%reason, "vote rejected by ledger");
                SubmissionOutcome {
                    status: VoteStatus::Rejected,
                    receipt: None,
                }
            }
            Err(LedgerError::Timeout) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "vote submission timed out");
                SubmissionOutcome {
                    status: VoteStatus::TimedOut,
                    receipt: None,
                }
            }
            Err(LedgerError::Transport(error)) => {
                tracing::warn!(%error, "ledger transport failure; outcome unknown");
                SubmissionOutcome {
                    status: VoteStatus::TimedOut,
                    receipt: None,
                }
            }
        }
    }

    /// Advisory tally check: reports the current count for a candidate.
    /// Failures are logged and reported as `false`, never propagated.
    pub fn verify<L: LedgerClient>(&self, candidate_id: u64, ledger: &L) -> bool {
        match ledger.get_tally(candidate_id) {
            Ok(count) => {
                tracing::info!(candidate_id, count, "current tally");
                true
            }
            Err(error) => {
                tracing::warn!(candidate_id, %error, "tally query failed");
                false
            }
        }
    }
}
