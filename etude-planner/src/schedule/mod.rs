pub mod batch;
pub mod capacity;
pub mod slot_utils;
pub mod types;

pub use batch::{
    assemble_batch, classify_batch_response, validate_batch, BatchForm, BatchOutcome,
    BatchSettings, PlannedDate,
};
pub use capacity::{reconcile_capacity, CapacityReport, CapacityStatus, Severity};
pub use slot_utils::{calculate_requested_slots, generate_time_slots, parse_time};
pub use types::{AppointmentCreationRequest, DateSlotConfiguration, Interval, SlotWindow, TimeOfDay};
