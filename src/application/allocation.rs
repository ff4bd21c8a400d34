//! Allocation engine
//!
//! The transactional boundary of the booking system. It is the only writer
//! of the capacity ledger and the reservation store, and keeps
//! `reserved_units` equal to the sum of `chicken_count` over the
//! capacity-holding reservations of each (location, date).
//!
//! Each mutation runs its locked section on a spawned task and commits the
//! ledger row and the reservation as one [`WriteSet`]. A caller that stops
//! waiting (client disconnect, shutdown timeout) cannot leave half of it
//! applied.

use std::future::Future;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, error, info};
use validator::ValidateEmail;

use super::ledger::{CapacityLedger, LedgerTxn};
use super::views::ReservationView;
use crate::domain::inventory::{InventorySnapshot, LedgerKey};
use crate::domain::location::SharedLocationCatalog;
use crate::domain::reservation::{
    ConfirmationCode, NewReservation, Reservation, ReservationStatus, TransitionError,
};
use crate::domain::{Actor, RepositoryProvider, WriteSet};
use crate::shared::errors::{DomainError, DomainResult};
use crate::shared::time::SharedClock;

const MAX_NAME_LEN: usize = 200;
const MAX_EMAIL_LEN: usize = 255;
const MAX_NOTES_LEN: usize = 500;

/// Tunables for admission and code generation.
#[derive(Debug, Clone)]
pub struct AllocationPolicy {
    /// Upper bound for each product count in a single reservation.
    pub max_units_per_product: u32,
    /// Confirmation-code generation attempts before giving up.
    pub code_attempts: u32,
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self {
            max_units_per_product: 50,
            code_attempts: 10,
        }
    }
}

/// Customer input for a new reservation. The reservation date is always the
/// location's current day.
#[derive(Debug, Clone)]
pub struct CreateReservation {
    pub location_id: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub chicken_count: u32,
    pub fries_count: u32,
    pub pickup_time: Option<NaiveTime>,
    pub notes: Option<String>,
}

type CodeSource = Arc<dyn Fn() -> ConfirmationCode + Send + Sync>;

pub struct AllocationEngine {
    repos: Arc<dyn RepositoryProvider>,
    ledger: Arc<CapacityLedger>,
    catalog: SharedLocationCatalog,
    clock: SharedClock,
    policy: AllocationPolicy,
    code_source: CodeSource,
}

pub type SharedAllocationEngine = Arc<AllocationEngine>;

impl AllocationEngine {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        ledger: Arc<CapacityLedger>,
        catalog: SharedLocationCatalog,
        clock: SharedClock,
        policy: AllocationPolicy,
    ) -> Self {
        Self {
            repos,
            ledger,
            catalog,
            clock,
            policy,
            code_source: Arc::new(ConfirmationCode::generate),
        }
    }

    /// Replace the confirmation-code generator.
    pub fn with_code_source(
        mut self,
        source: impl Fn() -> ConfirmationCode + Send + Sync + 'static,
    ) -> Self {
        self.code_source = Arc::new(source);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    // ── Commands ───────────────────────────────────────────────

    /// Validate, admit against the ledger, and store a confirmed reservation.
    ///
    /// Either both the ledger hold and the stored reservation exist
    /// afterwards, or neither does.
    pub async fn create_reservation(
        self: &Arc<Self>,
        request: CreateReservation,
    ) -> DomainResult<ReservationView> {
        let new = match self.validate(request) {
            Ok(new) => new,
            Err(e) => {
                metrics::counter!("reservations_rejected_total", "reason" => "validation").increment(1);
                return Err(e);
            }
        };

        let engine = Arc::clone(self);
        let reservation = detached(async move { engine.admit(new).await }).await?;

        metrics::counter!("reservations_created_total").increment(1);
        info!(
            id = %reservation.id,
            code = %reservation.confirmation_code,
            location = %reservation.location_id,
            date = %reservation.reservation_date,
            chicken = reservation.chicken_count,
            fries = reservation.fries_count,
            "Reservation confirmed"
        );
        Ok(self.view(reservation))
    }

    /// Customer cancellation by confirmation code.
    pub async fn cancel_by_code(self: &Arc<Self>, code: &str) -> DomainResult<ReservationView> {
        let code = ConfirmationCode::parse(code);
        let found = self
            .repos
            .reservations()
            .find_by_code(&code)
            .await?
            .ok_or_else(|| DomainError::not_found("Reservation", "confirmationCode", code.as_str()))?;

        let engine = Arc::clone(self);
        let updated = detached(async move {
            let key = LedgerKey::new(found.location_id.clone(), found.reservation_date);
            let txn = engine.ledger.begin(&key).await?;
            // Re-read under the lock; a concurrent cancel may have won.
            let current = engine.reload(&found.id).await?;

            if !current.can_cancel(engine.today()) {
                return Err(not_cancellable(&current));
            }
            engine
                .apply_transition(&txn, current, ReservationStatus::Cancelled, None)
                .await
        })
        .await?;

        info!(id = %updated.id, code = %code, "Reservation cancelled by customer");
        Ok(self.view(updated))
    }

    /// Privileged status change (pickup done, no-show, staff cancellation).
    pub async fn update_status(
        self: &Arc<Self>,
        id: &str,
        to: ReservationStatus,
        notes: Option<String>,
        actor: &Actor,
    ) -> DomainResult<ReservationView> {
        require_staff(actor)?;
        if let Some(n) = &notes {
            if n.chars().count() > MAX_NOTES_LEN {
                return Err(DomainError::Validation(format!(
                    "notes must not exceed {} characters",
                    MAX_NOTES_LEN
                )));
            }
        }

        let found = self
            .repos
            .reservations()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Reservation", "id", id))?;

        let engine = Arc::clone(self);
        let updated = detached(async move {
            let key = LedgerKey::new(found.location_id.clone(), found.reservation_date);
            let txn = engine.ledger.begin(&key).await?;
            let current = engine.reload(&found.id).await?;

            if to == ReservationStatus::Cancelled
                && current.status.allows_cancel()
                && !current.can_cancel(engine.today())
            {
                return Err(not_cancellable(&current));
            }
            engine.apply_transition(&txn, current, to, notes).await
        })
        .await?;

        info!(id = %updated.id, status = %updated.status, actor = %actor, "Reservation status updated");
        Ok(self.view(updated))
    }

    /// Staff entry of the day's total stock for a location.
    pub async fn set_inventory(
        &self,
        location_id: &str,
        date: Option<NaiveDate>,
        total: u32,
        actor: &Actor,
    ) -> DomainResult<InventorySnapshot> {
        require_staff(actor)?;
        self.catalog.get(location_id)?;
        let key = LedgerKey::new(location_id, date.unwrap_or_else(|| self.today()));
        debug!(key = %key, total, actor = %actor, "Setting daily inventory");
        self.ledger.set_total(&key, total).await
    }

    // ── Queries ────────────────────────────────────────────────

    pub async fn find_by_code(&self, code: &str) -> DomainResult<ReservationView> {
        let code = ConfirmationCode::parse(code);
        let r = self
            .repos
            .reservations()
            .find_by_code(&code)
            .await?
            .ok_or_else(|| DomainError::not_found("Reservation", "confirmationCode", code.as_str()))?;
        Ok(self.view(r))
    }

    pub async fn find_by_id(&self, id: &str, actor: &Actor) -> DomainResult<ReservationView> {
        require_staff(actor)?;
        let r = self
            .repos
            .reservations()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Reservation", "id", id))?;
        Ok(self.view(r))
    }

    /// Reservations for one location and day (staff scope).
    pub async fn list_for_location(
        &self,
        location_id: &str,
        date: Option<NaiveDate>,
        actor: &Actor,
    ) -> DomainResult<Vec<ReservationView>> {
        require_staff(actor)?;
        self.catalog.get(location_id)?;
        let date = date.unwrap_or_else(|| self.today());
        let list = self
            .repos
            .reservations()
            .list_by_location_and_date(location_id, date)
            .await?;
        Ok(list.into_iter().map(|r| self.view(r)).collect())
    }

    /// Reservations for a day across all locations, optionally narrowed to
    /// one (admin scope).
    pub async fn list_for_date(
        &self,
        date: Option<NaiveDate>,
        location_id: Option<&str>,
        actor: &Actor,
    ) -> DomainResult<Vec<ReservationView>> {
        if !actor.is_admin() {
            return Err(DomainError::Forbidden(
                "listing across locations requires the admin role".to_string(),
            ));
        }
        let date = date.unwrap_or_else(|| self.today());
        let store = self.repos.reservations();
        let list = match location_id {
            Some(id) => {
                self.catalog.get(id)?;
                store.list_by_location_and_date(id, date).await?
            }
            None => store.list_by_date(date).await?,
        };
        Ok(list.into_iter().map(|r| self.view(r)).collect())
    }

    // ── Internals ──────────────────────────────────────────────

    fn validate(&self, request: CreateReservation) -> DomainResult<NewReservation> {
        let location = self.catalog.get(&request.location_id)?;
        if !location.active {
            return Err(DomainError::Validation("location is not active".to_string()));
        }

        let now = self.clock.now();
        let today = now.date();
        let Some(hours) = location.hours_on(today) else {
            return Err(DomainError::Validation("location is closed today".to_string()));
        };

        let customer_name = request.customer_name.trim().to_string();
        if customer_name.is_empty() {
            return Err(DomainError::Validation("customer name is required".to_string()));
        }
        if customer_name.chars().count() > MAX_NAME_LEN {
            return Err(DomainError::Validation(format!(
                "customer name must not exceed {} characters",
                MAX_NAME_LEN
            )));
        }

        let customer_email = request
            .customer_email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        if let Some(email) = &customer_email {
            if email.len() > MAX_EMAIL_LEN || !email.validate_email() {
                return Err(DomainError::Validation("invalid email format".to_string()));
            }
        }

        let max = self.policy.max_units_per_product;
        if request.chicken_count > max || request.fries_count > max {
            return Err(DomainError::Validation(format!(
                "product counts must be between 0 and {}",
                max
            )));
        }
        if request.chicken_count + request.fries_count == 0 {
            return Err(DomainError::Validation(
                "at least one product must be selected".to_string(),
            ));
        }

        if let Some(pickup) = request.pickup_time {
            if !hours.contains(pickup) {
                return Err(DomainError::Validation(format!(
                    "pickup time must be within opening hours ({} - {})",
                    hours.opening_time.format("%H:%M"),
                    hours.closing_time.format("%H:%M")
                )));
            }
            if pickup < now.time() {
                return Err(DomainError::Validation(
                    "pickup time must be in the future".to_string(),
                ));
            }
        }

        let notes = request
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if notes.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTES_LEN) {
            return Err(DomainError::Validation(format!(
                "notes must not exceed {} characters",
                MAX_NOTES_LEN
            )));
        }

        Ok(NewReservation {
            location_id: location.id.clone(),
            reservation_date: today,
            customer_name,
            customer_email,
            chicken_count: request.chicken_count,
            fries_count: request.fries_count,
            pickup_time: request.pickup_time,
            notes,
        })
    }

    /// Locked part of creation: hold the units, then commit the hold and
    /// the reservation under a fresh confirmation code.
    async fn admit(&self, new: NewReservation) -> DomainResult<Reservation> {
        let key = LedgerKey::new(new.location_id.clone(), new.reservation_date);
        let units = new.chicken_count;

        // Fries-only orders never touch the ledger.
        let txn = if units > 0 {
            Some(self.ledger.begin(&key).await?)
        } else {
            None
        };
        let held = match &txn {
            Some(txn) => match txn.prepare_reserve(units).await {
                Ok(row) => Some(row),
                Err(e) => {
                    if matches!(e, DomainError::CapacityExceeded { .. }) {
                        metrics::counter!("reservations_rejected_total", "reason" => "capacity")
                            .increment(1);
                    }
                    info!(key = %key, units, error = %e, "Reservation rejected");
                    return Err(e);
                }
            },
            None => None,
        };

        let store = self.repos.reservations();
        for attempt in 1..=self.policy.code_attempts {
            let code = (self.code_source)();
            if store.code_exists(&code).await? {
                debug!(attempt, "Confirmation code collision, regenerating");
                continue;
            }
            let reservation = Reservation::confirmed(new.clone(), code, self.clock.now_utc());
            let writes = WriteSet::insert(reservation.clone()).with_inventory(held.clone());
            match self.repos.commit(writes).await {
                Ok(()) => return Ok(reservation),
                Err(DomainError::Conflict(_)) => {
                    debug!(attempt, "Confirmation code taken concurrently, regenerating");
                }
                Err(e) => {
                    error!(key = %key, error = %e, "Reservation commit failed");
                    return Err(e);
                }
            }
        }
        Err(DomainError::Internal(
            "unable to generate a unique confirmation code".to_string(),
        ))
    }

    async fn reload(&self, id: &str) -> DomainResult<Reservation> {
        self.repos
            .reservations()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Reservation", "id", id))
    }

    /// Validate `current → to` and commit it together with the ledger
    /// release when the new state no longer holds capacity. Caller must hold
    /// the key's txn.
    async fn apply_transition(
        &self,
        txn: &LedgerTxn<'_>,
        current: Reservation,
        to: ReservationStatus,
        notes: Option<String>,
    ) -> DomainResult<Reservation> {
        let from = current.status;
        from.transition(to).map_err(|e| match e {
            TransitionError::AlreadyFinalized => DomainError::AlreadyFinalized {
                status: from.to_string(),
            },
            TransitionError::NotAllowed => DomainError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            },
        })?;

        let released = if from.releases_on(to) && current.chicken_count > 0 {
            txn.prepare_release(current.chicken_count).await?
        } else {
            None
        };

        let mut updated = current;
        updated.status = to;
        updated.updated_at = self.clock.now_utc();
        if let Some(n) = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
            updated.notes = Some(n);
        }
        self.repos
            .commit(WriteSet::update(updated.clone()).with_inventory(released))
            .await?;

        metrics::counter!("reservation_transitions_total", "to" => to.as_str()).increment(1);
        Ok(updated)
    }

    fn view(&self, r: Reservation) -> ReservationView {
        let location = self.catalog.get(&r.location_id).ok();
        ReservationView::new(r, location, self.today())
    }
}

fn require_staff(actor: &Actor) -> DomainResult<()> {
    if actor.is_staff() {
        Ok(())
    } else {
        Err(DomainError::Forbidden(format!(
            "{} may not perform staff operations",
            actor.name
        )))
    }
}

/// Drive `work` to completion on its own task. Dropping the returned future
/// stops the wait, not the work.
async fn detached<T, F>(work: F) -> DomainResult<T>
where
    T: Send + 'static,
    F: Future<Output = DomainResult<T>> + Send + 'static,
{
    tokio::spawn(work)
        .await
        .map_err(|e| DomainError::Internal(format!("allocation task failed: {}", e)))?
}

fn not_cancellable(r: &Reservation) -> DomainError {
    let status = if r.status.is_terminal() {
        r.status.to_string()
    } else {
        format!("{}, reservation day {} has passed", r.status, r.reservation_date)
    };
    DomainError::AlreadyFinalized { status }
}
