//! Host-side frame driver.
//!
//! [`MatchSession`] wraps a [`Simulation`] with its collaborators: the
//! progress store and, in online modes, the network link. Collaborator calls
//! happen before and after the simulation step and their failures are logged
//! and skipped, so [`Simulation::tick`] never sees them.

use crate::combatant::PlayerSlot;
use crate::config::MatchConfig;
use crate::events::TickEvents;
use crate::input::FrameInput;
use crate::net::{snapshot_from_player, NetworkLink};
use crate::session::{SaveData, Session};
use crate::shop::ShopItem;
use crate::simulation::Simulation;

/// A running match and the services around it.
#[derive(Debug)]
pub struct MatchSession {
    simulation: Simulation,
    session: Option<Session>,
    link: Option<Box<dyn NetworkLink>>,
    remote_name: Option<String>,
    saves: u32,
}

impl MatchSession {
    /// Start a match, restoring saved progress into the primary player.
    #[must_use]
    pub fn new(config: MatchConfig, session: Option<Session>) -> Self {
        let mut simulation = Simulation::new(config);
        if let Some(session) = &session {
            let data = session.load();
            if let Some(player) = simulation.player_mut(PlayerSlot::One) {
                data.apply(player);
            }
        }
        Self {
            simulation,
            session,
            link: None,
            remote_name: None,
            saves: 0,
        }
    }

    /// Attach a network link for online modes.
    #[must_use]
    pub fn with_link(mut self, link: impl NetworkLink + 'static) -> Self {
        self.link = Some(Box::new(link));
        self
    }

    /// The simulation.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Mutable simulation, for scripted setups.
    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.simulation
    }

    /// Active session, if logged in or playing as a guest with a store.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Name the peer last reported.
    #[must_use]
    pub fn remote_name(&self) -> Option<&str> {
        self.remote_name.as_deref()
    }

    /// Saves that the store accepted during this match.
    #[must_use]
    pub const fn save_count(&self) -> u32 {
        self.saves
    }

    /// End the match and hand back the session, i.e. log out.
    #[must_use]
    pub fn into_session(self) -> Option<Session> {
        self.session
    }

    /// Run one frame: pull peer state, tick, push local state, save.
    pub fn step(&mut self, input: &FrameInput) -> TickEvents {
        self.receive_remote();
        let events = self.simulation.tick(input);
        self.send_local(input.players[0].fire);
        if events.progress_changed {
            self.save_progress();
        }
        events
    }

    /// Buy for the primary player and save on success.
    pub fn buy(&mut self, item: ShopItem) -> bool {
        let bought = self.simulation.buy(PlayerSlot::One, item);
        if bought {
            self.save_progress();
        }
        bought
    }

    /// Write the primary player's progress to the store.
    pub fn save_progress(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(player) = self.simulation.player(PlayerSlot::One) else {
            return;
        };
        if session.save(&SaveData::from_player(player)) {
            self.saves += 1;
        }
    }

    fn receive_remote(&mut self) {
        let Some(link) = self.link.as_mut() else {
            return;
        };
        let snapshots = match link.receive_snapshots() {
            Ok(snapshots) => snapshots,
            Err(error) => {
                tracing::warn!(%error, "Failed to receive snapshots");
                return;
            }
        };
        for snapshot in &snapshots {
            match self
                .simulation
                .apply_remote_snapshot(PlayerSlot::Two, snapshot)
            {
                Ok(_) => {}
                Err(error) => {
                    tracing::warn!(%error, "Dropped malformed snapshot");
                    continue;
                }
            }
            if let Ok(Some(name)) = snapshot.text(crate::net::KEY_NAME) {
                if self.remote_name.as_deref() != Some(name) {
                    tracing::info!(name, "Peer identified");
                    self.remote_name = Some(name.to_string());
                }
            }
        }
    }

    fn send_local(&mut self, shooting: bool) {
        let Some(link) = self.link.as_mut() else {
            return;
        };
        let Some(player) = self.simulation.player(PlayerSlot::One) else {
            return;
        };
        let name = self
            .session
            .as_ref()
            .and_then(Session::user)
            .unwrap_or(self.simulation.config().player_name.as_str());
        let snapshot = snapshot_from_player(player, shooting, name);
        if let Err(error) = link.send_snapshot(&snapshot) {
            tracing::warn!(%error, "Failed to send snapshot");
        }
    }
}
