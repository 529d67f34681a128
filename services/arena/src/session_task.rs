//! Per-session background task.
//!
//! Each session is owned by exactly one task. Callers reach it through a bounded command queue
//! and get their answer on a oneshot channel; the day loop runs in the same `select!`, so a
//! command never observes a half-resolved day and two resolutions never overlap.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use gauntlet_execution::{
    admin, ledger, lifecycle, process_day, DayScheduler, GameOutcome, TickDecision,
};
use gauntlet_types::{Action, AdminEvent, ArenaError, DayReport, Payout, Session, CORNUCOPIA};
use rand::rngs::StdRng;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::announce::AnnouncementSink;
use crate::balance::{BalanceError, BalanceService};
use crate::clock::Clock;
use crate::host::HostError;
use crate::persistence::SessionStore;

type Reply<T> = oneshot::Sender<Result<T, HostError>>;

pub enum Command {
    OpenSignup {
        reply: Reply<()>,
    },
    Register {
        id: String,
        name: String,
        reply: Reply<()>,
    },
    Start {
        npcs: usize,
        reply: Reply<()>,
    },
    SubmitAction {
        tribute: String,
        action: Action,
        zone: Option<String>,
        reply: Reply<()>,
    },
    PlaceBet {
        bettor: String,
        tribute: String,
        amount: u64,
        reply: Reply<u64>,
    },
    ForceNextDay {
        reply: Reply<()>,
    },
    Admin {
        event: AdminEvent,
        reply: Reply<Vec<String>>,
    },
    Stop {
        reply: Reply<Vec<Payout>>,
    },
    Snapshot {
        reply: oneshot::Sender<Session>,
    },
}

/// Collaborators shared by every session task.
#[derive(Clone)]
pub struct SessionDeps {
    pub balance: Arc<dyn BalanceService>,
    pub announcer: Arc<dyn AnnouncementSink>,
    pub store: Arc<dyn SessionStore>,
    pub clock: Arc<dyn Clock>,
}

#[derive(Clone, Debug)]
pub struct TaskConfig {
    pub poll: Duration,
    pub feast_pause: Duration,
    pub command_buffer: usize,
    pub scheduler: DayScheduler,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            poll: Duration::from_millis(1_000),
            feast_pause: Duration::from_millis(3_000),
            command_buffer: 64,
            scheduler: DayScheduler::default(),
        }
    }
}

/// Cloneable address of a session task.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    id: String,
    sender: mpsc::Sender<Command>,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, HostError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(build(reply))
            .await
            .map_err(|_| HostError::SessionClosed)?;
        response.await.map_err(|_| HostError::SessionClosed)?
    }

    pub async fn open_signup(&self) -> Result<(), HostError> {
        self.request(|reply| Command::OpenSignup { reply }).await
    }

    pub async fn register(&self, id: &str, name: &str) -> Result<(), HostError> {
        let (id, name) = (id.to_string(), name.to_string());
        self.request(|reply| Command::Register { id, name, reply })
            .await
    }

    pub async fn start(&self, npcs: usize) -> Result<(), HostError> {
        self.request(|reply| Command::Start { npcs, reply }).await
    }

    pub async fn submit_action(
        &self,
        tribute: &str,
        action: Action,
        zone: Option<&str>,
    ) -> Result<(), HostError> {
        let tribute = tribute.to_string();
        let zone = zone.map(str::to_string);
        self.request(|reply| Command::SubmitAction {
            tribute,
            action,
            zone,
            reply,
        })
        .await
    }

    /// Stake `amount` on `tribute`. Returns the bettor's total stake on that tribute.
    pub async fn place_bet(&self, bettor: &str, tribute: &str, amount: u64) -> Result<u64, HostError> {
        let (bettor, tribute) = (bettor.to_string(), tribute.to_string());
        self.request(|reply| Command::PlaceBet {
            bettor,
            tribute,
            amount,
            reply,
        })
        .await
    }

    pub async fn force_next_day(&self) -> Result<(), HostError> {
        self.request(|reply| Command::ForceNextDay { reply }).await
    }

    pub async fn admin(&self, event: AdminEvent) -> Result<Vec<String>, HostError> {
        self.request(|reply| Command::Admin { event, reply }).await
    }

    pub async fn stop(&self) -> Result<Vec<Payout>, HostError> {
        self.request(|reply| Command::Stop { reply }).await
    }

    pub async fn snapshot(&self) -> Result<Session, HostError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Command::Snapshot { reply })
            .await
            .map_err(|_| HostError::SessionClosed)?;
        response.await.map_err(|_| HostError::SessionClosed)
    }
}

pub struct SessionTask {
    session: Session,
    rng: StdRng,
    deps: SessionDeps,
    config: TaskConfig,
    /// Present only while a game is running.
    ticker: Option<Interval>,
    commands: mpsc::Receiver<Command>,
}

impl SessionTask {
    /// Build a task around `session`. A session that was persisted mid-game resumes its day loop.
    pub fn new(
        session: Session,
        deps: SessionDeps,
        config: TaskConfig,
        rng: StdRng,
    ) -> (Self, SessionHandle) {
        let (sender, commands) = mpsc::channel(config.command_buffer.max(1));
        let handle = SessionHandle {
            id: session.id.clone(),
            sender,
        };
        let mut task = Self {
            session,
            rng,
            deps,
            config,
            ticker: None,
            commands,
        };
        if task.session.is_running() {
            info!(session = %task.session.id, day = task.session.day_counter, "resuming day loop");
            task.arm_ticker();
        }
        (task, handle)
    }

    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                _ = next_tick(&mut self.ticker) => self.on_tick().await,
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
            }
        }
        info!(session = %self.session.id, "session task stopped");
    }

    fn arm_ticker(&mut self) {
        let mut ticker = time::interval(self.config.poll);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);
    }

    fn announce(&self, text: impl Into<String>) {
        self.deps.announcer.publish(&self.session.id, text.into());
    }

    async fn on_tick(&mut self) {
        let now = self.deps.clock.now_ms();
        match self.config.scheduler.check(&self.session, now) {
            TickDecision::Idle => {}
            TickDecision::Resolve => self.resolve_day(now).await,
            TickDecision::Conclude { winner } => {
                self.conclude(winner).await;
            }
        }
    }

    async fn resolve_day(&mut self, now: u64) {
        let expected = self.session.day_counter;
        let session = &self.session;
        let rng = &mut self.rng;
        let result = catch_unwind(AssertUnwindSafe(|| process_day(session, expected, rng)));

        let (next, report) = match result {
            Ok(Ok(resolved)) => resolved,
            Ok(Err(err)) => {
                error!(session = %self.session.id, day = expected, %err, "day resolution failed");
                self.announce(format!("The arena falters ({}); the day will be retried.", err.code()));
                return;
            }
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(session = %self.session.id, day = expected, %reason, "day resolution panicked");
                self.announce("The arena falters; the day will be retried.");
                return;
            }
        };

        self.session = next;
        pay(&self.deps, &self.session.id, &report.payouts).await;

        if let TickDecision::Conclude { winner } = self.config.scheduler.check(&self.session, now) {
            publish_report(&self.deps, &self.session.id, &report, self.config.feast_pause).await;
            self.conclude(winner).await;
            return;
        }

        self.config.scheduler.begin_next_day(&mut self.session, now);
        persist(&self.deps, &self.session).await;
        publish_report(&self.deps, &self.session.id, &report, self.config.feast_pause).await;
        self.announce_next_day();
    }

    fn announce_next_day(&self) {
        let secs = self.session.day_duration_ms / 1_000;
        let mut text = format!(
            "Day {} begins. {} tributes remain. Actions are due in {secs}s.",
            self.session.day_counter + 1,
            self.session.alive_count()
        );
        if self.session.feast_active {
            text.push_str(" A feast has been laid out at the Cornucopia.");
        }
        self.announce(text);
    }

    async fn conclude(&mut self, winner: Option<String>) -> GameOutcome {
        let outcome = lifecycle::end(&mut self.session, winner.as_deref());
        self.ticker = None;
        pay(&self.deps, &self.session.id, &outcome.payouts).await;
        persist(&self.deps, &self.session).await;
        match &outcome.winner_name {
            Some(name) => self.announce(format!(
                "{name} is the last tribute standing after {} days!",
                outcome.day
            )),
            None => self.announce(format!(
                "No tribute survived day {}. The arena claims everyone.",
                outcome.day
            )),
        }
        outcome
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::OpenSignup { reply } => {
                let result = lifecycle::open_signup(&mut self.session).map_err(HostError::from);
                if result.is_ok() {
                    persist(&self.deps, &self.session).await;
                    self.announce("Signup is open. Register to enter the arena.");
                }
                let _ = reply.send(result);
            }
            Command::Register { id, name, reply } => {
                let result =
                    lifecycle::register_player(&mut self.session, &id, &name, &mut self.rng)
                        .map_err(HostError::from);
                if result.is_ok() {
                    persist(&self.deps, &self.session).await;
                    if let Some(tribute) = self.session.tributes.get(&id) {
                        self.announce(format!(
                            "{} volunteers as tribute for district {}.",
                            tribute.name, tribute.faction
                        ));
                    }
                }
                let _ = reply.send(result);
            }
            Command::Start { npcs, reply } => {
                let now = self.deps.clock.now_ms();
                let result = lifecycle::start(
                    &mut self.session,
                    npcs,
                    now,
                    &self.config.scheduler,
                    &mut self.rng,
                )
                .map_err(HostError::from);
                if result.is_ok() {
                    self.arm_ticker();
                    persist(&self.deps, &self.session).await;
                    let zones: Vec<&str> = self
                        .session
                        .active_zones
                        .iter()
                        .map(|zone| zone.name.as_str())
                        .collect();
                    self.announce(format!(
                        "Game {} begins with {} tributes across {}.",
                        self.session.game_number,
                        self.session.tributes.len(),
                        zones.join(", ")
                    ));
                    self.announce_next_day();
                }
                let _ = reply.send(result);
            }
            Command::SubmitAction {
                tribute,
                action,
                zone,
                reply,
            } => {
                let result =
                    lifecycle::submit_action(&mut self.session, &tribute, action, zone.as_deref())
                        .map_err(HostError::from);
                if result.is_ok() {
                    persist(&self.deps, &self.session).await;
                }
                let _ = reply.send(result);
            }
            Command::PlaceBet {
                bettor,
                tribute,
                amount,
                reply,
            } => {
                let result = self.place_bet(&bettor, &tribute, amount).await;
                let _ = reply.send(result);
            }
            Command::ForceNextDay { reply } => {
                let result = if self.session.is_running() {
                    self.config.scheduler.force_next_day(&mut self.session);
                    persist(&self.deps, &self.session).await;
                    Ok(())
                } else {
                    Err(HostError::from(ArenaError::NotRunning))
                };
                let _ = reply.send(result);
            }
            Command::Admin { event, reply } => {
                let result = admin::apply_admin_event(&mut self.session, &event, &mut self.rng)
                    .map_err(HostError::from);
                if let Ok(lines) = &result {
                    persist(&self.deps, &self.session).await;
                    for line in lines {
                        self.announce(line.clone());
                    }
                }
                let _ = reply.send(result);
            }
            Command::Stop { reply } => {
                let result = match lifecycle::stop(&mut self.session) {
                    Ok(payouts) => {
                        self.ticker = None;
                        pay(&self.deps, &self.session.id, &payouts).await;
                        persist(&self.deps, &self.session).await;
                        self.announce("The game has been called off. Stakes were refunded.");
                        Ok(payouts)
                    }
                    Err(err) => Err(HostError::from(err)),
                };
                let _ = reply.send(result);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.session.clone());
            }
        }
    }

    /// Validate, debit, then record. Nothing is recorded if the debit fails.
    async fn place_bet(&mut self, bettor: &str, tribute: &str, amount: u64) -> Result<u64, HostError> {
        ledger::check_stake(&self.session, bettor, tribute, amount)?;
        match self.deps.balance.debit(bettor, amount).await {
            Ok(_) => {}
            Err(BalanceError::InsufficientFunds { balance, required }) => {
                return Err(ArenaError::InsufficientFunds { balance, required }.into());
            }
            Err(err) => {
                warn!(session = %self.session.id, %bettor, ?err, "stake debit failed");
                return Err(err.into());
            }
        }
        let total = ledger::record_stake(&mut self.session, bettor, tribute, amount);
        persist(&self.deps, &self.session).await;
        if let Some(target) = self.session.tributes.get(tribute) {
            let backing = self.session.ledger.staked_on(tribute);
            self.announce(format!(
                "A sponsor backs {} with {amount}. Total backing: {backing}.",
                target.name
            ));
        }
        info!(session = %self.session.id, %bettor, %tribute, amount, total, "stake recorded");
        Ok(total)
    }
}

async fn persist(deps: &SessionDeps, session: &Session) {
    if let Err(err) = deps.store.save(session).await {
        error!(session = %session.id, ?err, "failed to persist session snapshot");
    }
}

/// Credit payouts one by one. Failures are logged and skipped.
async fn pay(deps: &SessionDeps, session_id: &str, payouts: &[Payout]) {
    for payout in payouts {
        if let Err(err) = deps.balance.credit(&payout.recipient, payout.amount).await {
            error!(
                session = %session_id,
                recipient = %payout.recipient,
                amount = payout.amount,
                ?err,
                "failed to credit payout"
            );
        }
    }
}

/// Announce a day report group by group, pausing after the feast.
async fn publish_report(
    deps: &SessionDeps,
    session_id: &str,
    report: &DayReport,
    feast_pause: Duration,
) {
    deps.announcer
        .publish(session_id, format!("Day {} in the arena", report.day));
    for group in &report.groups {
        deps.announcer.publish(session_id, group.render());
        if report.feast_held && group.heading == CORNUCOPIA && !feast_pause.is_zero() {
            time::sleep(feast_pause).await;
        }
    }
    if !report.payouts.is_empty() {
        let total: u64 = report.payouts.iter().map(|p| p.amount).sum();
        deps.announcer
            .publish(session_id, format!("Sponsors paid out {total} in daily yield."));
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
