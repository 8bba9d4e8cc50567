//! Reconciliation engine
//!
//! Repairs flagged appointments so that the recorded total equals the sum of
//! the line-item prices. The store offers no multi-row transaction, so a
//! repair is persisted in two checkpoints: every line item one at a time,
//! then the total. The first failed write stops the repair and the error says
//! how far it got. Writes are absolute, so re-running a failed repair with the
//! same prices is safe.

use thiserror::Error;

use crate::audit::{AuditEntry, EntityType, Operation};
use crate::error::{AgendaError, AgendaResult};
use crate::models::{
    is_acceptable_input, parse_price, AppointmentId, LineItemId, Money, PriceInputError,
};
use crate::storage::PriceStore;

use super::scanner::{AnomalousAppointment, AnomalyScanner};

/// Where a repair stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairState {
    /// Produced by the scanner, awaiting operator prices
    Flagged,
    /// Operator inputs are being parsed
    Validating,
    /// Writes are being issued
    Persisting,
    /// Total equals the sum of the line items
    Reconciled,
    /// Validation or a write failed; can be retried
    Failed,
}

impl std::fmt::Display for RepairState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RepairState::Flagged => "flagged",
            RepairState::Validating => "validating",
            RepairState::Persisting => "persisting",
            RepairState::Reconciled => "reconciled",
            RepairState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// One line item whose operator input did not parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPrice {
    pub line_item_id: LineItemId,
    pub service_name: String,
    pub reason: PriceInputError,
}

impl std::fmt::Display for InvalidPrice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid price for service {}: {}", self.service_name, self.reason)
    }
}

/// Why a repair did not complete
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("appointment {0} is not awaiting repair")]
    UnknownAppointment(AppointmentId),

    #[error("line item {0} does not belong to this appointment")]
    UnknownLineItem(LineItemId),

    #[error("{}", join_invalid(.0))]
    Validation(Vec<InvalidPrice>),

    #[error("the total is zero; enter at least one price before saving")]
    ZeroTotal,

    /// A line-item write failed. Earlier line items stay written and the
    /// total was not touched.
    #[error(
        "could not save the price of {service_name}; {} line item(s) were already updated and the total was not changed",
        .written.len()
    )]
    LineItemWrite {
        service_name: String,
        written: Vec<LineItemId>,
        #[source]
        source: AgendaError,
    },

    /// Every line item was written but the total was not
    #[error("line item prices were saved but the appointment total ({total}) could not be written")]
    AggregateWrite {
        total: Money,
        #[source]
        source: AgendaError,
    },
}

fn join_invalid(invalid: &[InvalidPrice]) -> String {
    invalid
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ReconcileError {
    /// Whether the failure came from the data store rather than from input
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ReconcileError::LineItemWrite { .. } | ReconcileError::AggregateWrite { .. }
        )
    }
}

/// A flagged appointment with the operator's price text per line item
#[derive(Debug, Clone)]
pub struct RepairDraft {
    anomaly: AnomalousAppointment,
    inputs: Vec<String>,
    state: RepairState,
    last_error: Option<String>,
}

impl RepairDraft {
    /// Start a draft with the suggested price in every field
    pub fn new(anomaly: AnomalousAppointment) -> Self {
        let inputs = anomaly
            .line_items
            .iter()
            .map(|li| li.suggested_price().to_decimal_string())
            .collect();
        Self {
            anomaly,
            inputs,
            state: RepairState::Flagged,
            last_error: None,
        }
    }

    pub fn anomaly(&self) -> &AnomalousAppointment {
        &self.anomaly
    }

    pub fn appointment_id(&self) -> AppointmentId {
        self.anomaly.appointment_id
    }

    pub fn state(&self) -> RepairState {
        self.state
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Current text of a line item's price field
    pub fn input_for(&self, line_item_id: LineItemId) -> Option<&str> {
        self.position(line_item_id).map(|i| self.inputs[i].as_str())
    }

    /// Running total; text that does not parse counts as zero
    pub fn total(&self) -> Money {
        self.inputs
            .iter()
            .map(|input| parse_price(input).unwrap_or_default())
            .sum()
    }

    /// A zero total can never be submitted
    pub fn can_submit(&self) -> bool {
        !self.total().is_zero()
    }

    /// Find a line item by its ID or by the name of its service
    pub fn find_line_item(&self, key: &str) -> Option<LineItemId> {
        let key = key.trim();
        self.anomaly
            .line_items
            .iter()
            .find(|li| li.line_item_id.matches(key))
            .or_else(|| {
                self.anomaly
                    .line_items
                    .iter()
                    .find(|li| li.service_resolved && li.service_name.eq_ignore_ascii_case(key))
            })
            .map(|li| li.line_item_id)
    }

    fn position(&self, line_item_id: LineItemId) -> Option<usize> {
        self.anomaly
            .line_items
            .iter()
            .position(|li| li.line_item_id == line_item_id)
    }

    /// Parse every input and total them exactly
    fn validate(&self) -> Result<(Vec<Money>, Money), Vec<InvalidPrice>> {
        let mut prices = Vec::with_capacity(self.inputs.len());
        let mut invalid = Vec::new();
        let mut total = Money::zero();

        for (item, input) in self.anomaly.line_items.iter().zip(&self.inputs) {
            let parsed = parse_price(input).and_then(|price| {
                let sum = total
                    .checked_add(price)
                    .ok_or_else(|| PriceInputError::TooLarge(input.trim().to_string()))?;
                total = sum;
                Ok(price)
            });

            match parsed {
                Ok(price) => prices.push(price),
                Err(reason) => invalid.push(InvalidPrice {
                    line_item_id: item.line_item_id,
                    service_name: item.service_name.clone(),
                    reason,
                }),
            }
        }

        if invalid.is_empty() {
            Ok((prices, total))
        } else {
            Err(invalid)
        }
    }

    fn fail(&mut self, error: ReconcileError) -> ReconcileError {
        self.state = RepairState::Failed;
        self.last_error = Some(error.to_string());
        error
    }
}

/// A completed repair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub appointment_id: AppointmentId,
    pub total: Money,
    pub line_items_written: usize,
}

/// Result of repairing every pending appointment
#[derive(Debug, Default)]
pub struct ReconcileSummary {
    pub reconciled: Vec<ReconcileOutcome>,
    pub failed: Vec<(AppointmentId, ReconcileError)>,
    /// Zero-total drafts that were not submitted
    pub skipped: Vec<AppointmentId>,
}

impl ReconcileSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

/// Working set of repairs over a price store
pub struct ReconciliationEngine<'a, S: PriceStore + ?Sized> {
    store: &'a S,
    drafts: Vec<RepairDraft>,
}

impl<'a, S: PriceStore + ?Sized> ReconciliationEngine<'a, S> {
    /// Scan the store and start a draft for every anomalous appointment
    pub fn load(store: &'a S) -> AgendaResult<Self> {
        let anomalies = AnomalyScanner::new(store).find_anomalous_appointments()?;
        Ok(Self::from_anomalies(store, anomalies))
    }

    pub fn from_anomalies(store: &'a S, anomalies: Vec<AnomalousAppointment>) -> Self {
        Self {
            store,
            drafts: anomalies.into_iter().map(RepairDraft::new).collect(),
        }
    }

    /// Drafts still awaiting a successful repair
    pub fn pending(&self) -> &[RepairDraft] {
        &self.drafts
    }

    pub fn draft(&self, appointment_id: AppointmentId) -> Option<&RepairDraft> {
        self.drafts
            .iter()
            .find(|d| d.appointment_id() == appointment_id)
    }

    /// Find a pending draft by the ID text an operator typed
    pub fn find(&self, key: &str) -> Option<&RepairDraft> {
        self.drafts.iter().find(|d| d.appointment_id().matches(key))
    }

    /// Replace the text of one price field.
    ///
    /// Text that could never become a price is refused and the previous
    /// value is kept; the return value says whether the text was taken.
    pub fn set_price_input(
        &mut self,
        appointment_id: AppointmentId,
        line_item_id: LineItemId,
        input: &str,
    ) -> Result<bool, ReconcileError> {
        let draft = self.draft_mut(appointment_id)?;
        let index = draft
            .position(line_item_id)
            .ok_or(ReconcileError::UnknownLineItem(line_item_id))?;

        if !is_acceptable_input(input) {
            return Ok(false);
        }

        draft.inputs[index] = input.to_string();
        Ok(true)
    }

    pub fn total(&self, appointment_id: AppointmentId) -> Option<Money> {
        self.draft(appointment_id).map(RepairDraft::total)
    }

    pub fn can_submit(&self, appointment_id: AppointmentId) -> bool {
        self.draft(appointment_id).is_some_and(RepairDraft::can_submit)
    }

    /// Validate and persist one appointment's prices
    pub fn reconcile(
        &mut self,
        appointment_id: AppointmentId,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let store = self.store;
        let index = self
            .drafts
            .iter()
            .position(|d| d.appointment_id() == appointment_id)
            .ok_or(ReconcileError::UnknownAppointment(appointment_id))?;
        let draft = &mut self.drafts[index];

        let previous_state = draft.state;
        draft.state = RepairState::Validating;
        let (prices, total) = match draft.validate() {
            Ok(validated) => validated,
            Err(invalid) => {
                let error = draft.fail(ReconcileError::Validation(invalid));
                tracing::warn!(appointment = %appointment_id, error = %error, "repair rejected");
                return Err(error);
            }
        };

        if total.is_zero() {
            draft.state = previous_state;
            return Err(ReconcileError::ZeroTotal);
        }

        draft.state = RepairState::Persisting;
        let mut written = Vec::with_capacity(prices.len());
        let mut write_failure = None;

        for (item, price) in draft.anomaly.line_items.iter_mut().zip(&prices) {
            let after = match store.update_line_item_price(item.line_item_id, *price) {
                Ok(after) => after,
                Err(source) => {
                    write_failure = Some((item.line_item_id, item.service_name.clone(), source));
                    break;
                }
            };

            if item.final_price != after.final_price {
                let mut before = after.clone();
                before.final_price = item.final_price;
                store.record_audit(AuditEntry::change(
                    Operation::Reconcile,
                    EntityType::LineItem,
                    item.line_item_id.to_string(),
                    Some(item.service_name.clone()),
                    &before,
                    &after,
                ));
            }

            item.final_price = after.final_price;
            written.push(item.line_item_id);
        }

        if let Some((line_item_id, service_name, source)) = write_failure {
            tracing::warn!(
                appointment = %appointment_id,
                line_item = %line_item_id,
                written = written.len(),
                error = %source,
                "line item write failed"
            );
            return Err(draft.fail(ReconcileError::LineItemWrite {
                service_name,
                written,
                source,
            }));
        }

        let previous_total = draft.anomaly.final_price;

        match store.update_appointment_price(appointment_id, total) {
            Ok(after) => {
                if previous_total != after.final_price {
                    let mut before = after.clone();
                    before.final_price = previous_total;
                    store.record_audit(AuditEntry::change(
                        Operation::Reconcile,
                        EntityType::Appointment,
                        appointment_id.to_string(),
                        Some(draft.anomaly.client_name.clone()),
                        &before,
                        &after,
                    ));
                }
            }
            Err(source) => {
                tracing::warn!(
                    appointment = %appointment_id,
                    error = %source,
                    "appointment total write failed"
                );
                return Err(draft.fail(ReconcileError::AggregateWrite { total, source }));
            }
        }

        draft.state = RepairState::Reconciled;
        self.drafts.remove(index);

        tracing::info!(
            appointment = %appointment_id,
            total = %total,
            line_items = written.len(),
            "appointment reconciled"
        );

        Ok(ReconcileOutcome {
            appointment_id,
            total,
            line_items_written: written.len(),
        })
    }

    /// Repair every pending appointment that can be submitted.
    ///
    /// Each appointment is independent; a failure is recorded and the next one
    /// is attempted.
    pub fn reconcile_all(&mut self) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();
        let ids: Vec<_> = self.drafts.iter().map(RepairDraft::appointment_id).collect();

        for id in ids {
            match self.reconcile(id) {
                Ok(outcome) => summary.reconciled.push(outcome),
                Err(ReconcileError::ZeroTotal) => summary.skipped.push(id),
                Err(e) => summary.failed.push((id, e)),
            }
        }

        summary
    }

    fn draft_mut(&mut self, appointment_id: AppointmentId) -> Result<&mut RepairDraft, ReconcileError> {
        self.drafts
            .iter_mut()
            .find(|d| d.appointment_id() == appointment_id)
            .ok_or(ReconcileError::UnknownAppointment(appointment_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::AgendaPaths;
    use crate::models::{Appointment, AppointmentLineItem, Service};
    use crate::storage::Storage;
    use chrono::Utc;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        storage: Storage,
        appointment: Appointment,
        wash_item: AppointmentLineItem,
        cut_item: AppointmentLineItem,
    }

    /// Total 55.00 made of Wash 0.00 (catalog 15.00) and Cut 55.00
    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let storage =
            Storage::new(AgendaPaths::with_base_dir(temp.path().to_path_buf())).unwrap();

        let wash = Service::new("Wash", Money::from_cents(1500), 15);
        let cut = Service::new("Cut", Money::from_cents(5500), 45);
        storage.services.upsert(wash.clone()).unwrap();
        storage.services.upsert(cut.clone()).unwrap();

        let appointment =
            Appointment::with_final_price(None, Utc::now(), Money::from_cents(5500));
        let wash_item =
            AppointmentLineItem::new(appointment.id, Some(wash.id), Some(Money::zero()));
        let cut_item = AppointmentLineItem::new(
            appointment.id,
            Some(cut.id),
            Some(Money::from_cents(5500)),
        );
        storage.appointments.upsert(appointment.clone()).unwrap();
        storage.appointments.upsert_line_item(wash_item.clone()).unwrap();
        storage.appointments.upsert_line_item(cut_item.clone()).unwrap();

        Fixture {
            _temp: temp,
            storage,
            appointment,
            wash_item,
            cut_item,
        }
    }

    #[test]
    fn test_drafts_start_with_suggestions() {
        let f = fixture();
        let engine = ReconciliationEngine::load(&f.storage).unwrap();

        let draft = engine.draft(f.appointment.id).unwrap();
        assert_eq!(draft.state(), RepairState::Flagged);
        assert_eq!(draft.input_for(f.wash_item.id), Some("15.00"));
        assert_eq!(draft.input_for(f.cut_item.id), Some("55.00"));
        assert_eq!(engine.total(f.appointment.id), Some(Money::from_cents(7000)));
    }

    #[test]
    fn test_reconcile_restores_total() {
        let f = fixture();
        let mut engine = ReconciliationEngine::load(&f.storage).unwrap();

        let outcome = engine.reconcile(f.appointment.id).unwrap();
        assert_eq!(outcome.total, Money::from_cents(7000));
        assert_eq!(outcome.line_items_written, 2);
        assert!(engine.pending().is_empty());

        let stored = f.storage.appointments.get(f.appointment.id).unwrap().unwrap();
        let items = f.storage.appointments.line_items_for(f.appointment.id).unwrap();
        assert!(stored.is_reconciled(&items));
        assert_eq!(stored.final_price, Some(Money::from_cents(7000)));

        // One line item and the total changed
        assert_eq!(f.storage.audit_log().read_all().unwrap().len(), 2);
    }

    #[test]
    fn test_rejected_keystrokes_keep_previous_value() {
        let f = fixture();
        let mut engine = ReconciliationEngine::load(&f.storage).unwrap();
        let id = f.appointment.id;

        assert!(!engine.set_price_input(id, f.wash_item.id, "-3").unwrap());
        assert!(!engine.set_price_input(id, f.wash_item.id, "12a").unwrap());
        assert_eq!(engine.draft(id).unwrap().input_for(f.wash_item.id), Some("15.00"));

        assert!(engine.set_price_input(id, f.wash_item.id, "12.").unwrap());
        assert_eq!(engine.total(id), Some(Money::from_cents(6700)));

        assert!(matches!(
            engine.set_price_input(id, LineItemId::new(), "1"),
            Err(ReconcileError::UnknownLineItem(_))
        ));
    }

    #[test]
    fn test_zero_total_cannot_be_submitted() {
        let f = fixture();
        let mut engine = ReconciliationEngine::load(&f.storage).unwrap();
        let id = f.appointment.id;
        engine.set_price_input(id, f.wash_item.id, "0").unwrap();
        engine.set_price_input(id, f.cut_item.id, "").unwrap();

        assert!(!engine.can_submit(id));
        assert!(matches!(engine.reconcile(id), Err(ReconcileError::ZeroTotal)));

        let stored = f.storage.appointments.get(id).unwrap().unwrap();
        assert_eq!(stored.final_price, Some(Money::from_cents(5500)));
        assert_eq!(engine.pending().len(), 1);
    }

    #[test]
    fn test_unparseable_input_is_reported_before_zero_total() {
        let f = fixture();
        let mut engine = ReconciliationEngine::load(&f.storage).unwrap();
        let id = f.appointment.id;
        assert!(engine.set_price_input(id, f.wash_item.id, "1.234").unwrap());
        engine.set_price_input(id, f.cut_item.id, "").unwrap();

        match engine.reconcile(id) {
            Err(ReconcileError::Validation(invalid)) => {
                assert_eq!(invalid.len(), 1);
                assert_eq!(invalid[0].service_name, "Wash");
                assert!(matches!(invalid[0].reason, PriceInputError::TooPrecise(_)));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(engine.draft(id).unwrap().state(), RepairState::Failed);
    }

    #[test]
    fn test_huge_prices_are_rejected_without_writes() {
        let f = fixture();
        let mut engine = ReconciliationEngine::load(&f.storage).unwrap();
        let id = f.appointment.id;
        assert!(engine
            .set_price_input(id, f.wash_item.id, "92233720368547758.07")
            .unwrap());
        engine.set_price_input(id, f.cut_item.id, "1").unwrap();

        assert!(engine.total(id).is_some());
        match engine.reconcile(id) {
            Err(ReconcileError::Validation(invalid)) => {
                assert_eq!(invalid[0].service_name, "Wash");
                assert!(matches!(invalid[0].reason, PriceInputError::TooLarge(_)));
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let stored = f.storage.appointments.get(id).unwrap().unwrap();
        assert_eq!(stored.final_price, Some(Money::from_cents(5500)));
        let wash = f.storage.appointments.get_line_item(f.wash_item.id).unwrap().unwrap();
        assert_eq!(wash.final_price, Some(Money::zero()));
    }

    #[test]
    fn test_invalid_input_names_the_service() {
        let f = fixture();
        let mut engine = ReconciliationEngine::load(&f.storage).unwrap();
        let id = f.appointment.id;
        engine.set_price_input(id, f.wash_item.id, "1.234").unwrap();

        let err = engine.reconcile(id).unwrap_err();
        match &err {
            ReconcileError::Validation(invalid) => {
                assert_eq!(invalid.len(), 1);
                assert_eq!(invalid[0].service_name, "Wash");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("Wash"));

        let draft = engine.draft(id).unwrap();
        assert_eq!(draft.state(), RepairState::Failed);
        assert!(draft.last_error().is_some());

        // Nothing was written
        let item = f.storage.appointments.get_line_item(f.wash_item.id).unwrap().unwrap();
        assert_eq!(item.final_price, Some(Money::zero()));
    }

    #[test]
    fn test_find_line_item_by_service_name() {
        let f = fixture();
        let engine = ReconciliationEngine::load(&f.storage).unwrap();
        let draft = engine.find(&f.appointment.id.to_string()).unwrap();

        assert_eq!(draft.find_line_item("wash"), Some(f.wash_item.id));
        assert_eq!(draft.find_line_item(&f.cut_item.id.to_string()), Some(f.cut_item.id));
        assert_eq!(draft.find_line_item("Color"), None);
    }

    #[test]
    fn test_reconcile_all_skips_zero_totals() {
        let f = fixture();
        let stray = Appointment::new(None, Utc::now());
        f.storage.appointments.upsert(stray.clone()).unwrap();

        let mut engine = ReconciliationEngine::load(&f.storage).unwrap();
        let summary = engine.reconcile_all();

        assert_eq!(summary.reconciled.len(), 1);
        assert_eq!(summary.skipped, vec![stray.id]);
        assert!(summary.failed.is_empty());
        assert!(!summary.is_complete());
    }
}
