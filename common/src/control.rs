use crate::{
    state::ControlContext,
    types::{HeatingMode, HotWaterMode, TimeOfDay},
};

const CURVE_LINEAR: f32 = -0.5;
const CURVE_CUBIC: f32 = -0.0005;
const CURVE_OFFSET: f32 = 36.0;

/// Boiler flow setpoint for a given outside temperature and curve shift.
pub fn heating_curve(outside_temp: f32, temp_shift: f32) -> f32 {
    let x = outside_temp + temp_shift;
    CURVE_LINEAR * x + CURVE_CUBIC * x * x * x + CURVE_OFFSET
}

/// Recomputes enable flags and setpoints from the current context.
///
/// Runs every iteration. Disabled programs leave their previous outputs in
/// place rather than resetting them.
pub fn recompute(ctx: &mut ControlContext) {
    manage_heating(ctx);
    manage_hot_water(ctx);
}

fn manage_heating(ctx: &mut ControlContext) {
    let config = &ctx.config;
    if !config.heating_program {
        return;
    }

    let outputs = &mut ctx.outputs;
    match config.heating_mode {
        HeatingMode::Auto => {
            let outside = ctx.measurements.outside_temp;
            outputs.central_heating_enabled = outside < config.heating_threshold;
            let mut setpoint = heating_curve(outside, config.temp_shift);
            if ctx.schedule.time_of_day == TimeOfDay::Night {
                setpoint *= config.night_offset_factor;
            }
            outputs.boiler_setpoint = setpoint;
        }
        HeatingMode::Boost => {
            outputs.central_heating_enabled = true;
            outputs.boiler_setpoint = config.boiler_boost_sp;
        }
    }
}

fn manage_hot_water(ctx: &mut ControlContext) {
    let config = &ctx.config;
    let schedule = &ctx.schedule;
    let outputs = &mut ctx.outputs;

    if config.hot_water_program {
        match config.hot_water_mode {
            HotWaterMode::Automatic => {
                outputs.hot_water_enabled = false;
                outputs.dhw_setpoint = config.dhw_night_sp;

                // Applied in order; a later match overrides an earlier one.
                let rules = [
                    (TimeOfDay::Morning, config.dhw_morning_sp),
                    (TimeOfDay::Day, config.dhw_day_sp),
                    (TimeOfDay::Evening, config.dhw_evening_sp),
                    (TimeOfDay::Night, config.dhw_night_sp),
                ];
                for (bucket, setpoint) in rules {
                    if schedule.time_of_day == bucket {
                        outputs.hot_water_enabled = true;
                        outputs.dhw_setpoint = setpoint;
                    }
                }
            }
            HotWaterMode::Manual => {
                outputs.hot_water_enabled = true;
                outputs.dhw_setpoint = config.dhw_boost_sp;
            }
        }
    }

    if config.legionella_program
        && schedule.day_of_week == config.legionella_day
        && schedule.time_of_day == TimeOfDay::Evening
    {
        outputs.hot_water_enabled = true;
        outputs.dhw_setpoint = config.dhw_legionella_sp;
    }
}
