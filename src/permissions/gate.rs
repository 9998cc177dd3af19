// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Two-phase consent protocol.
//!
//! `ensure` either grants synchronously or hands back a [`ConsentRequest`]
//! carrying a token. The UI answers later through `resolve`, which tells the
//! caller whether to re-run the original action once or give up.

use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{PermissionAuthority, PermissionKind, PermissionOutcome};

/// Operation to re-invoke once consent arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    Connect,
    Scan,
}

/// Identifies one outstanding consent prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PromptToken(u64);

impl PromptToken {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Prompt the UI must show: exactly the kinds that are missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentRequest {
    pub token: PromptToken,
    pub kinds: Vec<PermissionKind>,
}

/// Result of [`PermissionGate::ensure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Granted,
    Pending(ConsentRequest),
}

/// Result of [`PermissionGate::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Every prompted kind was granted; run the action again, once.
    Retry(PendingAction),
    /// At least one kind was refused; the action is abandoned.
    Denied(PendingAction),
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("no pending consent prompt for token {0}")]
    UnknownToken(u64),
    #[error("failed to record permission decision: {0}")]
    Record(#[from] anyhow::Error),
}

struct PendingPrompt {
    action: PendingAction,
    kinds: Vec<PermissionKind>,
}

/// Checks grants and tracks prompts that are awaiting an answer.
pub struct PermissionGate<A> {
    authority: A,
    pending: HashMap<PromptToken, PendingPrompt>,
    next_token: u64,
}

impl<A: PermissionAuthority> PermissionGate<A> {
    pub fn new(authority: A) -> Self {
        Self {
            authority,
            pending: HashMap::new(),
            next_token: 1,
        }
    }

    /// Whether a single kind is granted right now.
    pub fn is_granted(&self, kind: PermissionKind) -> bool {
        self.authority.is_granted(kind)
    }

    /// Check `kinds`, issuing a consent prompt for the missing ones.
    pub fn ensure(&mut self, kinds: &[PermissionKind], action: PendingAction) -> GateDecision {
        let mut missing: Vec<PermissionKind> = kinds
            .iter()
            .copied()
            .filter(|kind| !self.authority.is_granted(*kind))
            .collect();
        missing.sort();
        missing.dedup();

        if missing.is_empty() {
            return GateDecision::Granted;
        }

        let token = PromptToken(self.next_token);
        self.next_token += 1;
        info!("Requesting consent for {:?} ({:?})", missing, action);

        self.pending.insert(
            token,
            PendingPrompt {
                action,
                kinds: missing.clone(),
            },
        );

        GateDecision::Pending(ConsentRequest {
            token,
            kinds: missing,
        })
    }

    /// Apply the user's answer to a prompt and decide what happens next.
    ///
    /// Kinds absent from `outcome` count as refused. The token is consumed.
    pub fn resolve(
        &mut self,
        token: PromptToken,
        outcome: &PermissionOutcome,
    ) -> Result<Resolution, GateError> {
        let prompt = self
            .pending
            .remove(&token)
            .ok_or(GateError::UnknownToken(token.0))?;

        let mut all_granted = true;
        for kind in &prompt.kinds {
            let granted = outcome.get(kind).copied().unwrap_or(false);
            self.authority.record(*kind, granted)?;
            if !granted {
                all_granted = false;
            }
        }

        if all_granted {
            debug!("Consent granted for {:?}, retrying", prompt.action);
            Ok(Resolution::Retry(prompt.action))
        } else {
            warn!("Consent refused for {:?}", prompt.action);
            Ok(Resolution::Denied(prompt.action))
        }
    }

    /// Number of prompts awaiting an answer.
    pub fn pending_prompts(&self) -> usize {
        self.pending.len()
    }

    pub fn authority(&self) -> &A {
        &self.authority
    }

    /// Revoke every grant and drop prompts still awaiting an answer.
    pub fn reset(&mut self) -> Result<(), GateError> {
        let dropped = self.pending.len();
        self.pending.clear();
        for kind in PermissionKind::ALL {
            self.authority.revoke(kind)?;
        }
        info!("Permissions reset ({} open prompt(s) dropped)", dropped);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[derive(Default)]
    struct MemoryAuthority {
        granted: HashSet<PermissionKind>,
    }

    impl PermissionAuthority for MemoryAuthority {
        fn is_granted(&self, kind: PermissionKind) -> bool {
            self.granted.contains(&kind)
        }

        fn record(&mut self, kind: PermissionKind, granted: bool) -> anyhow::Result<()> {
            if granted {
                self.granted.insert(kind);
            } else {
                self.granted.remove(&kind);
            }
            Ok(())
        }

        fn revoke(&mut self, kind: PermissionKind) -> anyhow::Result<()> {
            self.granted.remove(&kind);
            Ok(())
        }
    }

    fn outcome(pairs: &[(PermissionKind, bool)]) -> PermissionOutcome {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_granted_when_nothing_missing() {
        let mut authority = MemoryAuthority::default();
        authority.granted.insert(PermissionKind::Connect);
        let mut gate = PermissionGate::new(authority);

        let decision = gate.ensure(&[PermissionKind::Connect], PendingAction::Connect);
        assert_eq!(decision, GateDecision::Granted);
        assert_eq!(gate.pending_prompts(), 0);
    }

    #[test]
    fn test_prompt_lists_only_missing_kinds() {
        let mut authority = MemoryAuthority::default();
        authority.granted.insert(PermissionKind::Scan);
        let mut gate = PermissionGate::new(authority);

        let decision = gate.ensure(
            &[PermissionKind::Scan, PermissionKind::FineLocation],
            PendingAction::Scan,
        );
        match decision {
            GateDecision::Pending(request) => {
                assert_eq!(request.kinds, vec![PermissionKind::FineLocation]);
            }
            GateDecision::Granted => panic!("expected a prompt"),
        }
    }

    #[test]
    fn test_full_grant_retries_action() {
        let mut gate = PermissionGate::new(MemoryAuthority::default());
        let GateDecision::Pending(request) = gate.ensure(
            &[PermissionKind::Scan, PermissionKind::FineLocation],
            PendingAction::Scan,
        ) else {
            panic!("expected a prompt");
        };

        let resolution = gate
            .resolve(
                request.token,
                &outcome(&[
                    (PermissionKind::Scan, true),
                    (PermissionKind::FineLocation, true),
                ]),
            )
            .unwrap();

        assert_eq!(resolution, Resolution::Retry(PendingAction::Scan));
        assert!(gate.is_granted(PermissionKind::Scan));
        assert!(gate.is_granted(PermissionKind::FineLocation));
    }

    #[test]
    fn test_partial_grant_is_denial() {
        let mut gate = PermissionGate::new(MemoryAuthority::default());
        let GateDecision::Pending(request) = gate.ensure(
            &[PermissionKind::Scan, PermissionKind::FineLocation],
            PendingAction::Scan,
        ) else {
            panic!("expected a prompt");
        };

        let resolution = gate
            .resolve(
                request.token,
                &outcome(&[
                    (PermissionKind::Scan, true),
                    (PermissionKind::FineLocation, false),
                ]),
            )
            .unwrap();

        assert_eq!(resolution, Resolution::Denied(PendingAction::Scan));
        // The granted half is still recorded.
        assert!(gate.is_granted(PermissionKind::Scan));
        assert!(!gate.is_granted(PermissionKind::FineLocation));
    }

    #[test]
    fn test_missing_answer_counts_as_denied() {
        let mut gate = PermissionGate::new(MemoryAuthority::default());
        let GateDecision::Pending(request) =
            gate.ensure(&[PermissionKind::Connect], PendingAction::Connect)
        else {
            panic!("expected a prompt");
        };

        let resolution = gate.resolve(request.token, &PermissionOutcome::new()).unwrap();
        assert_eq!(resolution, Resolution::Denied(PendingAction::Connect));
    }

    #[test]
    fn test_token_is_single_use() {
        let mut gate = PermissionGate::new(MemoryAuthority::default());
        let GateDecision::Pending(request) =
            gate.ensure(&[PermissionKind::Connect], PendingAction::Connect)
        else {
            panic!("expected a prompt");
        };

        let answer = outcome(&[(PermissionKind::Connect, true)]);
        assert!(gate.resolve(request.token, &answer).is_ok());
        assert!(matches!(
            gate.resolve(request.token, &answer),
            Err(GateError::UnknownToken(_))
        ));
    }

    #[test]
    fn test_tokens_are_distinct() {
        let mut gate = PermissionGate::new(MemoryAuthority::default());
        let first = gate.ensure(&[PermissionKind::Connect], PendingAction::Connect);
        let second = gate.ensure(&[PermissionKind::Advertise], PendingAction::Connect);

        match (first, second) {
            (GateDecision::Pending(a), GateDecision::Pending(b)) => {
                assert_ne!(a.token, b.token);
                assert_eq!(gate.pending_prompts(), 2);
            }
            _ => panic!("expected two prompts"),
        }
    }

    #[test]
    fn test_reset_revokes_grants_and_open_prompts() {
        let mut authority = MemoryAuthority::default();
        authority.granted.insert(PermissionKind::Connect);
        let mut gate = PermissionGate::new(authority);
        let GateDecision::Pending(request) =
            gate.ensure(&[PermissionKind::Scan], PendingAction::Scan)
        else {
            panic!("expected a prompt");
        };

        gate.reset().unwrap();

        assert!(!gate.is_granted(PermissionKind::Connect));
        assert_eq!(gate.pending_prompts(), 0);
        let answer = outcome(&[(PermissionKind::Scan, true)]);
        assert!(matches!(
            gate.resolve(request.token, &answer),
            Err(GateError::UnknownToken(_))
        ));
        assert!(!gate.is_granted(PermissionKind::Scan));
    }
}
