use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::{
    opentherm::{self, MessageId},
    state::ControlContext,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    /// Transport was never initialised.
    None,
    Success,
    Invalid,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    pub frame: u32,
    pub status: ResponseStatus,
}

impl Response {
    pub fn new(frame: u32, status: ResponseStatus) -> Self {
        Self { frame, status }
    }

    pub fn message_id(&self) -> Option<MessageId> {
        MessageId::from_code(opentherm::data_id(self.frame))
    }

    fn temperature(&self) -> f32 {
        opentherm::data_to_temperature(opentherm::data_value(self.frame))
    }
}

/// Completed transactions waiting for the next drain.
#[derive(Debug, Clone, Default)]
pub struct CompletionQueue {
    pending: VecDeque<Response>,
}

impl CompletionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, response: Response) {
        self.pending.push_back(response);
    }

    pub fn pop(&mut self) -> Option<Response> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Classifies every queued response in arrival order; returns how many were handled.
    pub fn drain_into(&mut self, ctx: &mut ControlContext) -> usize {
        let mut handled = 0;
        while let Some(response) = self.pop() {
            on_response(ctx, &response);
            handled += 1;
        }
        handled
    }
}

/// Updates measurements and appliance status from one completed transaction.
///
/// Attribution is by the data id in the frame only, independent of which
/// request is currently outstanding.
pub fn on_response(ctx: &mut ControlContext, response: &Response) {
    let Some(id) = response.message_id() else {
        debug!(frame = response.frame, "ignoring response with unknown data id");
        return;
    };

    if id == MessageId::Status {
        classify_status(ctx, response);
        return;
    }

    if response.status != ResponseStatus::Success {
        return;
    }

    let measurements = &mut ctx.measurements;
    match id {
        MessageId::Toutside => {
            measurements.outside_temp = (measurements.outside_temp * 9.0 + response.temperature()) / 10.0;
        }
        MessageId::Tboiler => measurements.boiler_temp = response.temperature(),
        MessageId::Texhaust => measurements.exhaust_temp = response.temperature(),
        MessageId::Tdhw => measurements.dhw_temp = response.temperature(),
        MessageId::Tret => measurements.return_water_temp = response.temperature(),
        // Setpoint write acknowledgements carry nothing we track.
        MessageId::TSet | MessageId::TdhwSet | MessageId::Status => {}
    }
}

fn classify_status(ctx: &mut ControlContext, response: &Response) {
    let appliance = &mut ctx.appliance;
    match response.status {
        ResponseStatus::Success => {
            appliance.central_heating_active = opentherm::is_central_heating_active(response.frame);
            appliance.hot_water_active = opentherm::is_hot_water_active(response.frame);
            appliance.flame_on = opentherm::is_flame_on(response.frame);
            appliance.status_code = if appliance.flame_on {
                "FlameOn ".to_string()
            } else {
                "noFlame ".to_string()
            };
        }
        ResponseStatus::None => {
            warn!("opentherm transport is not initialized");
            appliance.status_code = "no Init ".to_string();
        }
        ResponseStatus::Invalid => {
            warn!("invalid opentherm response {:x}", response.frame);
            appliance.status_code = format!("{:x}", response.frame);
        }
        ResponseStatus::Timeout => {
            warn!("opentherm response timeout");
            appliance.status_code = "Timeout ".to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::opentherm::{compose_ack, reading_to_data, RequestType};

    fn read_ack(id: MessageId, temp: f32) -> Response {
        let frame = compose_ack(RequestType::Read, id, reading_to_data(temp));
        Response::new(frame, ResponseStatus::Success)
    }

    fn status(flags: u8, status: ResponseStatus) -> Response {
        Response::new(0x4000_0000 | u32::from(flags), status)
    }

    #[test]
    fn status_success_sets_flags_and_flame_string() {
        let mut ctx = ControlContext::default();

        on_response(&mut ctx, &status(0b0000_0010, ResponseStatus::Success));
        assert!(ctx.appliance.central_heating_active);
        assert!(!ctx.appliance.flame_on);
        assert_eq!(ctx.appliance.status_code, "noFlame ");

        on_response(&mut ctx, &status(0b0000_1100, ResponseStatus::Success));
        assert!(!ctx.appliance.central_heating_active);
        assert!(ctx.appliance.hot_water_active);
        assert!(ctx.appliance.flame_on);
        assert_eq!(ctx.appliance.status_code, "FlameOn ");
    }

    #[test]
    fn status_failures_keep_last_known_flags() {
        let mut ctx = ControlContext::default();
        on_response(&mut ctx, &status(0b0000_1110, ResponseStatus::Success));
        let before = ctx.appliance.clone();

        on_response(&mut ctx, &status(0, ResponseStatus::Timeout));
        assert_eq!(ctx.appliance.status_code, "Timeout ");

        on_response(&mut ctx, &Response::new(0x0000_CDEF, ResponseStatus::Invalid));
        assert_eq!(ctx.appliance.status_code, "cdef");

        on_response(&mut ctx, &status(0, ResponseStatus::None));
        assert_eq!(ctx.appliance.status_code, "no Init ");

        assert_eq!(ctx.appliance.central_heating_active, before.central_heating_active);
        assert_eq!(ctx.appliance.hot_water_active, before.hot_water_active);
        assert_eq!(ctx.appliance.flame_on, before.flame_on);
    }

    #[test]
    fn outside_temperature_is_smoothed() {
        let mut ctx = ControlContext::default();
        ctx.measurements.outside_temp = 0.0;

        on_response(&mut ctx, &read_ack(MessageId::Toutside, 10.0));
        assert!((ctx.measurements.outside_temp - 1.0).abs() < 1e-5);
    }

    #[test]
    fn smoothing_contracts_geometrically() {
        let mut ctx = ControlContext::default();
        let start = ctx.measurements.outside_temp;
        let target = 5.0;

        for _ in 0..20 {
            on_response(&mut ctx, &read_ack(MessageId::Toutside, target));
        }
        let expected_gap = (start - target).abs() * 0.9f32.powi(20);
        assert!(((ctx.measurements.outside_temp - target).abs() - expected_gap).abs() < 1e-3);

        for _ in 0..80 {
            on_response(&mut ctx, &read_ack(MessageId::Toutside, target));
        }
        assert!((ctx.measurements.outside_temp - target).abs() < 0.01);
    }

    #[test]
    fn small_gap_settles_within_twenty_samples() {
        let mut ctx = ControlContext::default();
        ctx.measurements.outside_temp = 7.05;

        for _ in 0..20 {
            on_response(&mut ctx, &read_ack(MessageId::Toutside, 7.0));
        }
        assert!((ctx.measurements.outside_temp - 7.0).abs() < 0.01);
    }

    #[test]
    fn direct_readings_overwrite() {
        let mut ctx = ControlContext::default();

        on_response(&mut ctx, &read_ack(MessageId::Tboiler, 48.5));
        on_response(&mut ctx, &read_ack(MessageId::Tret, 35.25));
        on_response(&mut ctx, &read_ack(MessageId::Texhaust, 61.0));
        on_response(&mut ctx, &read_ack(MessageId::Tdhw, 44.75));

        assert_eq!(ctx.measurements.boiler_temp, 48.5);
        assert_eq!(ctx.measurements.return_water_temp, 35.25);
        assert_eq!(ctx.measurements.exhaust_temp, 61.0);
        assert_eq!(ctx.measurements.dhw_temp, 44.75);
    }

    #[test]
    fn failed_readings_and_other_kinds_leave_state_alone() {
        let mut ctx = ControlContext::default();
        ctx.measurements.boiler_temp = 42.0;
        let before = ctx.clone();

        let mut timeout = read_ack(MessageId::Tboiler, 80.0);
        timeout.status = ResponseStatus::Timeout;
        on_response(&mut ctx, &timeout);
        on_response(&mut ctx, &read_ack(MessageId::TSet, 60.0));
        on_response(&mut ctx, &Response::new(0x0063_0000, ResponseStatus::Success));

        assert_eq!(ctx, before);
    }

    #[test]
    fn queue_drains_in_arrival_order() {
        let mut ctx = ControlContext::default();
        let mut queue = CompletionQueue::new();
        queue.push(read_ack(MessageId::Tdhw, 30.0));
        queue.push(read_ack(MessageId::Tdhw, 31.0));
        queue.push(status(0b1000, ResponseStatus::Success));

        assert_eq!(queue.drain_into(&mut ctx), 3);
        assert!(queue.is_empty());
        assert_eq!(ctx.measurements.dhw_temp, 31.0);
        assert!(ctx.appliance.flame_on);
    }
}
