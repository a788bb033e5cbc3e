pub const TOPIC_STATE: &str = "boiler/state";
pub const TOPIC_AVAILABILITY: &str = "boiler/status";
pub const TOPIC_CMD_PREFIX: &str = "boiler/cmnd/";

pub const TOPIC_CMD_DHW_MORNING: &str = "boiler/cmnd/dhw/morning";
pub const TOPIC_CMD_DHW_DAY: &str = "boiler/cmnd/dhw/day";
pub const TOPIC_CMD_DHW_EVENING: &str = "boiler/cmnd/dhw/evening";
pub const TOPIC_CMD_DHW_NIGHT: &str = "boiler/cmnd/dhw/night";
pub const TOPIC_CMD_DHW_LEGIONELLA: &str = "boiler/cmnd/dhw/legionella";
pub const TOPIC_CMD_DHW_BOOST: &str = "boiler/cmnd/dhw/boost";
pub const TOPIC_CMD_BOILER_BOOST: &str = "boiler/cmnd/heating/boost_temp";
pub const TOPIC_CMD_HEATING_THRESHOLD: &str = "boiler/cmnd/heating/threshold";
pub const TOPIC_CMD_TEMP_SHIFT: &str = "boiler/cmnd/heating/shift";
pub const TOPIC_CMD_NIGHT_OFFSET: &str = "boiler/cmnd/heating/night_factor";

pub const TOPIC_CMD_MORNING_START: &str = "boiler/cmnd/schedule/morning";
pub const TOPIC_CMD_DAY_START: &str = "boiler/cmnd/schedule/day";
pub const TOPIC_CMD_EVENING_START: &str = "boiler/cmnd/schedule/evening";
pub const TOPIC_CMD_NIGHT_START: &str = "boiler/cmnd/schedule/night";
pub const TOPIC_CMD_LEGIONELLA_DAY: &str = "boiler/cmnd/schedule/legionella_day";

pub const TOPIC_CMD_HEATING_BOOST: &str = "boiler/cmnd/switch/heating_boost";
pub const TOPIC_CMD_HOT_WATER_BOOST: &str = "boiler/cmnd/switch/hot_water_boost";
pub const TOPIC_CMD_HEATING_PROGRAM: &str = "boiler/cmnd/switch/heating_program";
pub const TOPIC_CMD_HOT_WATER_PROGRAM: &str = "boiler/cmnd/switch/hot_water_program";
pub const TOPIC_CMD_LEGIONELLA_PROGRAM: &str = "boiler/cmnd/switch/legionella_program";

/// Wildcard the controller subscribes to for every command topic.
pub const TOPIC_CMD_WILDCARD: &str = "boiler/cmnd/#";
