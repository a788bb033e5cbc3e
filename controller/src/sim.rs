use boiler_common::{
    opentherm::{self, MessageId},
    CompletionQueue, Response, ResponseStatus, Transaction, Transport,
};
use tracing::{debug, warn};

const DEFAULT_LATENCY_MS: u64 = 100;
const AMBIENT_TEMP: f32 = 18.0;

/// In-process stand-in for the boiler on the other end of the OpenTherm bus.
///
/// Holds at most one request in flight and answers it once the latency has
/// passed. Water temperatures drift toward whatever the last status and
/// setpoint writes asked for.
#[derive(Debug)]
pub struct SimulatedBoiler {
    latency_ms: u64,
    timeout_every: Option<u32>,
    submitted: u32,
    in_flight: Option<(Transaction, Option<u64>)>,
    last_poll_ms: Option<u64>,
    central_heating_enabled: bool,
    hot_water_enabled: bool,
    boiler_setpoint: f32,
    dhw_setpoint: f32,
    flow_temp: f32,
    dhw_temp: f32,
    outside_base: f32,
    elapsed_ms: u64,
}

impl Default for SimulatedBoiler {
    fn default() -> Self {
        Self {
            latency_ms: DEFAULT_LATENCY_MS,
            timeout_every: None,
            submitted: 0,
            in_flight: None,
            last_poll_ms: None,
            central_heating_enabled: false,
            hot_water_enabled: false,
            boiler_setpoint: 0.0,
            dhw_setpoint: 0.0,
            flow_temp: 30.0,
            dhw_temp: 40.0,
            outside_base: 4.0,
            elapsed_ms: 0,
        }
    }
}

impl SimulatedBoiler {
    /// `BOILER_SIM_LATENCY_MS` and `BOILER_SIM_TIMEOUT_EVERY` tune the bus.
    pub fn from_env() -> Self {
        let mut boiler = Self::default();
        if let Some(latency) = env_parse::<u64>("BOILER_SIM_LATENCY_MS") {
            boiler.latency_ms = latency;
        }
        boiler.timeout_every = env_parse::<u32>("BOILER_SIM_TIMEOUT_EVERY").filter(|n| *n > 0);
        boiler
    }

    fn burning_for_heating(&self) -> bool {
        self.central_heating_enabled && self.flow_temp < self.boiler_setpoint
    }

    fn burning_for_hot_water(&self) -> bool {
        self.hot_water_enabled && self.dhw_temp < self.dhw_setpoint
    }

    fn flame_on(&self) -> bool {
        self.burning_for_heating() || self.burning_for_hot_water()
    }

    fn outside_temp(&self) -> f32 {
        // One slow swing every ten minutes.
        let phase = (self.elapsed_ms % 600_000) as f32 / 600_000.0;
        self.outside_base + 6.0 * (phase * std::f32::consts::TAU).sin()
    }

    fn return_temp(&self) -> f32 {
        if self.burning_for_heating() {
            self.flow_temp - 8.0
        } else {
            self.flow_temp - 2.0
        }
    }

    fn exhaust_temp(&self) -> f32 {
        if self.flame_on() {
            self.flow_temp + 15.0
        } else {
            AMBIENT_TEMP + 2.0
        }
    }

    fn advance(&mut self, dt_ms: u64) {
        self.elapsed_ms += dt_ms;
        let dt = dt_ms as f32 / 1000.0;
        let heating = self.burning_for_heating();
        let hot_water = self.burning_for_hot_water();

        let flow_target = if heating { self.boiler_setpoint + 2.0 } else { AMBIENT_TEMP };
        self.flow_temp += (flow_target - self.flow_temp) * (0.02 * dt).min(1.0);

        let dhw_target = if hot_water { self.dhw_setpoint + 1.0 } else { AMBIENT_TEMP };
        let rate = if hot_water { 0.01 } else { 0.0005 };
        self.dhw_temp += (dhw_target - self.dhw_temp) * (rate * dt).min(1.0);
    }

    fn answer(&mut self, transaction: &Transaction) -> u32 {
        let id = transaction.message_id();
        let data = match id {
            MessageId::Status => {
                let master = (transaction.data >> 8) as u8;
                self.central_heating_enabled = master & 0x01 != 0;
                self.hot_water_enabled = master & 0x02 != 0;
                opentherm::slave_status_data(
                    self.burning_for_heating(),
                    self.burning_for_hot_water(),
                    self.flame_on(),
                )
            }
            MessageId::TSet => {
                self.boiler_setpoint = opentherm::data_to_temperature(transaction.data);
                transaction.data
            }
            MessageId::TdhwSet => {
                self.dhw_setpoint = opentherm::data_to_temperature(transaction.data);
                transaction.data
            }
            MessageId::Tboiler => opentherm::reading_to_data(self.flow_temp),
            MessageId::Tdhw => opentherm::reading_to_data(self.dhw_temp),
            MessageId::Toutside => opentherm::reading_to_data(self.outside_temp()),
            MessageId::Tret => opentherm::reading_to_data(self.return_temp()),
            MessageId::Texhaust => opentherm::reading_to_data(self.exhaust_temp()),
        };
        opentherm::compose_ack(transaction.request_type(), id, data)
    }
}

impl Transport for SimulatedBoiler {
    fn is_ready(&self) -> bool {
        self.in_flight.is_none()
    }

    fn submit(&mut self, transaction: &Transaction) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        self.submitted = self.submitted.wrapping_add(1);
        // Due time is fixed on the next poll, which knows the clock.
        self.in_flight = Some((*transaction, None));
        true
    }

    fn poll(&mut self, now_ms: u64, completions: &mut CompletionQueue) {
        let dt = self.last_poll_ms.map_or(0, |last| now_ms.saturating_sub(last));
        self.last_poll_ms = Some(now_ms);
        self.advance(dt);

        let Some((transaction, due)) = self.in_flight.take() else {
            return;
        };
        let due = due.unwrap_or(now_ms + self.latency_ms);
        if now_ms < due {
            self.in_flight = Some((transaction, Some(due)));
            return;
        }

        let timed_out = self
            .timeout_every
            .is_some_and(|every| self.submitted % every == 0);
        let response = if timed_out {
            debug!(kind = ?transaction.kind, "simulated bus timeout");
            Response::new(transaction.frame(), ResponseStatus::Timeout)
        } else {
            Response::new(self.answer(&transaction), ResponseStatus::Success)
        };
        completions.push(response);
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable environment value");
            None
        }
    }
}
