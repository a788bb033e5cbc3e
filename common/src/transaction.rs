use serde::Serialize;
use tracing::trace;

use crate::{
    opentherm::{self, MessageId, RequestType},
    response::CompletionQueue,
    state::ControlContext,
};

/// Data word sent with every read request.
const READ_DATA: u16 = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransactionKind {
    WriteStatus,
    WriteBoilerSetpoint,
    WriteDhwSetpoint,
    ReadOutsideTemp,
    ReadBoilerTemp,
    ReadExhaustTemp,
    ReadDhwTemp,
    ReadReturnTemp,
}

impl TransactionKind {
    /// Round-robin order, indexed by slot.
    pub const CYCLE: [Self; 8] = [
        Self::WriteStatus,
        Self::WriteBoilerSetpoint,
        Self::WriteDhwSetpoint,
        Self::ReadOutsideTemp,
        Self::ReadBoilerTemp,
        Self::ReadExhaustTemp,
        Self::ReadDhwTemp,
        Self::ReadReturnTemp,
    ];

    pub fn from_slot(slot: u8) -> Self {
        Self::CYCLE[usize::from(slot) % Self::CYCLE.len()]
    }

    pub fn message_id(self) -> MessageId {
        match self {
            Self::WriteStatus => MessageId::Status,
            Self::WriteBoilerSetpoint => MessageId::TSet,
            Self::WriteDhwSetpoint => MessageId::TdhwSet,
            Self::ReadOutsideTemp => MessageId::Toutside,
            Self::ReadBoilerTemp => MessageId::Tboiler,
            Self::ReadExhaustTemp => MessageId::Texhaust,
            Self::ReadDhwTemp => MessageId::Tdhw,
            Self::ReadReturnTemp => MessageId::Tret,
        }
    }

    pub fn request_type(self) -> RequestType {
        match self {
            Self::WriteStatus | Self::WriteBoilerSetpoint | Self::WriteDhwSetpoint => {
                RequestType::Write
            }
            _ => RequestType::Read,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    pub slot: u8,
    pub kind: TransactionKind,
    pub data: u16,
}

impl Transaction {
    pub fn build(slot: u8, ctx: &ControlContext) -> Self {
        let kind = TransactionKind::from_slot(slot);
        let outputs = &ctx.outputs;
        let data = match kind {
            TransactionKind::WriteStatus => opentherm::master_status_data(
                outputs.central_heating_enabled,
                outputs.hot_water_enabled,
                outputs.cooling_enabled,
            ),
            TransactionKind::WriteBoilerSetpoint => {
                opentherm::temperature_to_data(outputs.boiler_setpoint)
            }
            TransactionKind::WriteDhwSetpoint => opentherm::temperature_to_data(outputs.dhw_setpoint),
            _ => READ_DATA,
        };
        Self { slot, kind, data }
    }

    pub fn message_id(&self) -> MessageId {
        self.kind.message_id()
    }

    pub fn request_type(&self) -> RequestType {
        self.kind.request_type()
    }

    /// Frame without parity.
    pub fn frame(&self) -> u32 {
        opentherm::compose(self.request_type(), self.message_id(), self.data)
    }
}

/// The asynchronous request/response primitive offered by the protocol layer.
pub trait Transport {
    /// Idle and able to take a new request.
    fn is_ready(&self) -> bool;

    /// Non-blocking; `true` when the request was scheduled for transmission.
    fn submit(&mut self, transaction: &Transaction) -> bool;

    /// Moves finished requests (success, timeout or invalid frame) into `completions`.
    fn poll(&mut self, now_ms: u64, completions: &mut CompletionQueue);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Busy,
    Rejected(TransactionKind),
    Submitted(TransactionKind),
}

/// Advances on acceptance, not on completion: responses are matched by the
/// data id they carry, so a pipelined request never confuses attribution.
#[derive(Debug, Clone, Default)]
pub struct TransactionCycle {
    slot: u8,
}

impl TransactionCycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self) -> u8 {
        self.slot
    }

    pub fn tick<T: Transport + ?Sized>(
        &mut self,
        ctx: &ControlContext,
        transport: &mut T,
    ) -> CycleOutcome {
        if !transport.is_ready() {
            return CycleOutcome::Busy;
        }

        let transaction = Transaction::build(self.slot, ctx);
        if !transport.submit(&transaction) {
            trace!(slot = self.slot, kind = ?transaction.kind, "transaction rejected");
            return CycleOutcome::Rejected(transaction.kind);
        }

        trace!(slot = self.slot, kind = ?transaction.kind, data = transaction.data, "transaction submitted");
        self.slot = (self.slot + 1) % TransactionKind::CYCLE.len() as u8;
        CycleOutcome::Submitted(transaction.kind)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use pretty_assertions::assert_eq;

    use super::*;

    /// Scripted transport: each `submit` pops one accept/reject decision.
    struct ScriptedTransport {
        ready: bool,
        decisions: VecDeque<bool>,
        submitted: Vec<Transaction>,
    }

    impl ScriptedTransport {
        fn new(decisions: &[bool]) -> Self {
            Self {
                ready: true,
                decisions: decisions.iter().copied().collect(),
                submitted: Vec::new(),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn is_ready(&self) -> bool {
            self.ready
        }

        fn submit(&mut self, transaction: &Transaction) -> bool {
            let accepted = self.decisions.pop_front().unwrap_or(true);
            if accepted {
                self.submitted.push(*transaction);
            }
            accepted
        }

        fn poll(&mut self, _now_ms: u64, _completions: &mut CompletionQueue) {}
    }

    #[test]
    fn slot_wraps_after_eight_accepted_submissions() {
        let ctx = ControlContext::default();
        let mut cycle = TransactionCycle::new();
        let mut transport = ScriptedTransport::new(&[]);

        let mut slots = Vec::new();
        for _ in 0..10 {
            slots.push(cycle.slot());
            cycle.tick(&ctx, &mut transport);
        }

        assert_eq!(slots, vec![0, 1, 2, 3, 4, 5, 6, 7, 0, 1]);
        let kinds: Vec<_> = transport.submitted.iter().take(8).map(|t| t.kind).collect();
        assert_eq!(kinds, TransactionKind::CYCLE.to_vec());
    }

    #[test]
    fn rejected_submission_does_not_advance() {
        let ctx = ControlContext::default();
        let mut cycle = TransactionCycle::new();
        let mut transport = ScriptedTransport::new(&[true, false, false, true, false, true]);

        let mut trace = Vec::new();
        for _ in 0..6 {
            let outcome = cycle.tick(&ctx, &mut transport);
            trace.push((outcome, cycle.slot()));
        }

        assert_eq!(
            trace,
            vec![
                (CycleOutcome::Submitted(TransactionKind::WriteStatus), 1),
                (CycleOutcome::Rejected(TransactionKind::WriteBoilerSetpoint), 1),
                (CycleOutcome::Rejected(TransactionKind::WriteBoilerSetpoint), 1),
                (CycleOutcome::Submitted(TransactionKind::WriteBoilerSetpoint), 2),
                (CycleOutcome::Rejected(TransactionKind::WriteDhwSetpoint), 2),
                (CycleOutcome::Submitted(TransactionKind::WriteDhwSetpoint), 3),
            ]
        );
    }

    #[test]
    fn busy_transport_is_not_asked_to_submit() {
        let ctx = ControlContext::default();
        let mut cycle = TransactionCycle::new();
        let mut transport = ScriptedTransport::new(&[]);
        transport.ready = false;

        assert_eq!(cycle.tick(&ctx, &mut transport), CycleOutcome::Busy);
        assert_eq!(cycle.slot(), 0);
        assert!(transport.submitted.is_empty());
    }

    #[test]
    fn transactions_carry_current_outputs() {
        let mut ctx = ControlContext::default();
        ctx.outputs.central_heating_enabled = true;
        ctx.outputs.hot_water_enabled = true;
        ctx.outputs.boiler_setpoint = 38.5;
        ctx.outputs.dhw_setpoint = 46.0;

        assert_eq!(Transaction::build(0, &ctx).data, 0x0300);
        assert_eq!(Transaction::build(1, &ctx).data, 0x2680);
        assert_eq!(Transaction::build(2, &ctx).data, 46 * 256);
        for slot in 3..8 {
            let transaction = Transaction::build(slot, &ctx);
            assert_eq!(transaction.request_type(), RequestType::Read);
            assert_eq!(transaction.data, READ_DATA);
        }
    }

    #[test]
    fn frame_encodes_write_setpoint() {
        let mut ctx = ControlContext::default();
        ctx.outputs.boiler_setpoint = 55.0;
        let frame = Transaction::build(1, &ctx).frame();

        assert_eq!(frame, 0x1001_3700);
    }
}
