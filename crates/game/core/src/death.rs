//! Linear life-cycle: `NotDead → DeathStarted → DeathFinished`.
//!
//! The state only moves forward. Each entered state raises a marker tag on
//! the owner and is broadcast once on [`DeathSequence::on_death`].

use crate::authority::{AuthorityError, NetRole, ensure_authority};
use crate::events::Delegate;
use crate::ids::EntityId;
use crate::tags::{self, TagStackContainer};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeathState {
    #[default]
    NotDead,
    DeathStarted,
    DeathFinished,
}

/// Broadcast when a death state is entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeathEvent {
    pub owner: EntityId,
    pub state: DeathState,
}

/// What a transition request did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeathTransition {
    /// State moved forward; every entered state was broadcast.
    Advanced { from: DeathState, to: DeathState },
    /// Already in (or past) the requested state.
    Unchanged(DeathState),
    /// Backward request; logged and ignored.
    Invalid {
        from: DeathState,
        requested: DeathState,
    },
    /// Authoritative state is behind the local prediction; local state kept.
    PredictedAhead {
        local: DeathState,
        authoritative: DeathState,
    },
}

impl DeathTransition {
    pub fn advanced(&self) -> bool {
        matches!(self, Self::Advanced { .. })
    }
}

#[derive(Debug)]
pub struct DeathSequence {
    owner: EntityId,
    role: NetRole,
    state: DeathState,
    on_death: Delegate<DeathEvent>,
}

impl DeathSequence {
    pub fn new(owner: EntityId, role: NetRole) -> Self {
        Self {
            owner,
            role,
            state: DeathState::NotDead,
            on_death: Delegate::new(),
        }
    }

    pub fn state(&self) -> DeathState {
        self.state
    }

    pub fn is_dead_or_dying(&self) -> bool {
        self.state > DeathState::NotDead
    }

    pub fn on_death(&mut self) -> &mut Delegate<DeathEvent> {
        &mut self.on_death
    }

    /// No-op unless `NotDead`.
    pub fn start_death(
        &mut self,
        markers: &mut TagStackContainer,
    ) -> Result<DeathTransition, AuthorityError> {
        ensure_authority(self.role, self.owner, "start_death")?;
        if self.state != DeathState::NotDead {
            return Ok(DeathTransition::Unchanged(self.state));
        }
        self.enter_started(markers);
        Ok(DeathTransition::Advanced {
            from: DeathState::NotDead,
            to: DeathState::DeathStarted,
        })
    }

    /// No-op unless `DeathStarted`.
    pub fn finish_death(
        &mut self,
        markers: &mut TagStackContainer,
    ) -> Result<DeathTransition, AuthorityError> {
        ensure_authority(self.role, self.owner, "finish_death")?;
        if self.state != DeathState::DeathStarted {
            return Ok(DeathTransition::Unchanged(self.state));
        }
        self.enter_finished(markers);
        Ok(DeathTransition::Advanced {
            from: DeathState::DeathStarted,
            to: DeathState::DeathFinished,
        })
    }

    /// Moves to `target`, replaying every skipped transition. Backward
    /// requests are logged and ignored.
    pub fn transition_to(
        &mut self,
        target: DeathState,
        markers: &mut TagStackContainer,
    ) -> Result<DeathTransition, AuthorityError> {
        ensure_authority(self.role, self.owner, "transition_to")?;
        if target < self.state {
            tracing::error!(
                owner = %self.owner,
                from = %self.state,
                requested = %target,
                "invalid death state transition"
            );
            return Ok(DeathTransition::Invalid {
                from: self.state,
                requested: target,
            });
        }
        Ok(self.advance_to(target, markers))
    }

    /// Applies an authoritative state on a replica.
    ///
    /// A state behind the local prediction is rejected with a warning; a
    /// state ahead replays the skipped transitions so their side effects
    /// still run.
    pub fn reconcile(
        &mut self,
        authoritative: DeathState,
        markers: &mut TagStackContainer,
    ) -> DeathTransition {
        if self.role.is_authority() {
            tracing::error!(owner = %self.owner, %authoritative, "death reconcile on authority");
            return DeathTransition::Invalid {
                from: self.state,
                requested: authoritative,
            };
        }
        if authoritative < self.state {
            tracing::warn!(
                owner = %self.owner,
                local = %self.state,
                %authoritative,
                "death state predicted ahead of authority"
            );
            return DeathTransition::PredictedAhead {
                local: self.state,
                authoritative,
            };
        }
        self.advance_to(authoritative, markers)
    }

    fn advance_to(&mut self, target: DeathState, markers: &mut TagStackContainer) -> DeathTransition {
        let from = self.state;
        if target == from {
            return DeathTransition::Unchanged(from);
        }
        if from == DeathState::NotDead {
            self.enter_started(markers);
        }
        if target == DeathState::DeathFinished {
            self.enter_finished(markers);
        }
        DeathTransition::Advanced {
            from,
            to: self.state,
        }
    }

    fn enter_started(&mut self, markers: &mut TagStackContainer) {
        self.state = DeathState::DeathStarted;
        markers.set_count(tags::STATUS_DEATH_DYING, 1);
        tracing::info!(owner = %self.owner, "death started");
        self.on_death.broadcast(&DeathEvent {
            owner: self.owner,
            state: DeathState::DeathStarted,
        });
    }

    fn enter_finished(&mut self, markers: &mut TagStackContainer) {
        self.state = DeathState::DeathFinished;
        markers.set_count(tags::STATUS_DEATH_DEAD, 1);
        tracing::info!(owner = %self.owner, "death finished");
        self.on_death.broadcast(&DeathEvent {
            owner: self.owner,
            state: DeathState::DeathFinished,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn recorded(sequence: &mut DeathSequence) -> Arc<Mutex<Vec<DeathState>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        sequence
            .on_death()
            .subscribe(move |event: &DeathEvent| sink.lock().unwrap().push(event.state));
        seen
    }

    #[test]
    fn start_death_twice_broadcasts_once() {
        let mut markers = TagStackContainer::new();
        let mut death = DeathSequence::new(EntityId(1), NetRole::Authority);
        let seen = recorded(&mut death);

        assert!(death.start_death(&mut markers).unwrap().advanced());
        assert_eq!(
            death.start_death(&mut markers).unwrap(),
            DeathTransition::Unchanged(DeathState::DeathStarted)
        );

        assert_eq!(*seen.lock().unwrap(), vec![DeathState::DeathStarted]);
        assert_eq!(markers.count(&tags::STATUS_DEATH_DYING), 1);
        assert!(death.is_dead_or_dying());
    }

    #[test]
    fn finish_requires_started() {
        let mut markers = TagStackContainer::new();
        let mut death = DeathSequence::new(EntityId(1), NetRole::Authority);

        assert_eq!(
            death.finish_death(&mut markers).unwrap(),
            DeathTransition::Unchanged(DeathState::NotDead)
        );
        death.start_death(&mut markers).unwrap();
        death.finish_death(&mut markers).unwrap();
        assert_eq!(death.state(), DeathState::DeathFinished);
        assert!(markers.contains(&tags::STATUS_DEATH_DEAD));
    }

    #[test]
    fn backward_request_is_ignored() {
        let mut markers = TagStackContainer::new();
        let mut death = DeathSequence::new(EntityId(1), NetRole::Authority);
        death.start_death(&mut markers).unwrap();

        let transition = death.transition_to(DeathState::NotDead, &mut markers).unwrap();
        assert_eq!(
            transition,
            DeathTransition::Invalid {
                from: DeathState::DeathStarted,
                requested: DeathState::NotDead
            }
        );
        assert_eq!(death.state(), DeathState::DeathStarted);
    }

    #[test]
    fn reconcile_ahead_replays_skipped_transitions() {
        let mut markers = TagStackContainer::new();
        let mut death = DeathSequence::new(EntityId(2), NetRole::Replica);
        let seen = recorded(&mut death);

        let transition = death.reconcile(DeathState::DeathFinished, &mut markers);

        assert_eq!(
            transition,
            DeathTransition::Advanced {
                from: DeathState::NotDead,
                to: DeathState::DeathFinished
            }
        );
        assert_eq!(
            *seen.lock().unwrap(),
            vec![DeathState::DeathStarted, DeathState::DeathFinished]
        );
        assert!(markers.contains(&tags::STATUS_DEATH_DYING));
        assert!(markers.contains(&tags::STATUS_DEATH_DEAD));
    }

    #[test]
    fn reconcile_behind_keeps_local_state() {
        let mut markers = TagStackContainer::new();
        let mut death = DeathSequence::new(EntityId(2), NetRole::Replica);
        death.reconcile(DeathState::DeathStarted, &mut markers);

        let transition = death.reconcile(DeathState::NotDead, &mut markers);
        assert!(matches!(transition, DeathTransition::PredictedAhead { .. }));
        assert_eq!(death.state(), DeathState::DeathStarted);
    }

    #[test]
    fn replica_cannot_start_death() {
        let mut markers = TagStackContainer::new();
        let mut death = DeathSequence::new(EntityId(2), NetRole::Replica);
        assert!(death.start_death(&mut markers).is_err());
        assert_eq!(death.state(), DeathState::NotDead);
        assert!(markers.is_empty());
    }

    #[test]
    fn observed_states_never_move_backwards() {
        let mut markers = TagStackContainer::new();
        let mut death = DeathSequence::new(EntityId(3), NetRole::Authority);
        let mut observed = vec![death.state()];
        let requests = [
            DeathState::DeathStarted,
            DeathState::NotDead,
            DeathState::DeathStarted,
            DeathState::DeathFinished,
            DeathState::DeathStarted,
        ];
        for target in requests {
            death.transition_to(target, &mut markers).unwrap();
            observed.push(death.state());
        }
        assert!(observed.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(death.state(), DeathState::DeathFinished);
    }
}
