//! ENTITY-SENSOR-MIB `entPhySensorTable` for transceiver DOM sensors.
//!
//! Each transceiver is numbered `ifindex * 1000`; its sensors add a part id
//! on top (see [`sensor_sub_id`]). Readings come from STATE_DB
//! `TRANSCEIVER_DOM_SENSOR|<port>` for every port with `TRANSCEIVER_INFO`.

use crate::db::{DbId, NamespaceDbs};
use crate::error::Result;
use crate::mibs::loader::{load_interfaces_all, InterfaceMaps};
use crate::mibs::{next_cell, MibUpdater, MibValue, Oid, SnapshotCell, SubId, UpdaterState};
use crate::tables::{
    table_key, SEPARATOR_VBAR, STATE_TRANSCEIVER_DOM_SENSOR_TABLE, STATE_TRANSCEIVER_INFO_TABLE,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// `entPhySensorEntry` (1.3.6.1.2.1.99.1.1.1)
pub const SENSOR_PREFIX: [u32; 10] = [1, 3, 6, 1, 2, 1, 99, 1, 1, 1];

/// type, scale, precision, value, oper status
const SENSOR_COLUMNS: [u32; 5] = [1, 2, 3, 4, 5];

const SENSOR_VALUE_LIMIT: f64 = 1e9;

/// `EntitySensorDataType`
mod sensor_type {
    pub const VOLTS_DC: i32 = 4;
    pub const AMPERES: i32 = 5;
    pub const WATTS: i32 = 6;
    pub const CELSIUS: i32 = 8;
}

/// `EntitySensorDataScale`
mod sensor_scale {
    pub const MILLI: i32 = 8;
    pub const UNITS: i32 = 9;
}

/// `EntitySensorStatus` ok
const SENSOR_STATUS_OK: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Temperature,
    Voltage,
    RxPower,
    TxBias,
    TxPower,
}

impl SensorKind {
    pub const fn data_type(&self) -> i32 {
        match self {
            SensorKind::Temperature => sensor_type::CELSIUS,
            SensorKind::Voltage => sensor_type::VOLTS_DC,
            SensorKind::RxPower | SensorKind::TxPower => sensor_type::WATTS,
            SensorKind::TxBias => sensor_type::AMPERES,
        }
    }

    pub const fn scale(&self) -> i32 {
        match self {
            SensorKind::Temperature | SensorKind::Voltage => sensor_scale::UNITS,
            _ => sensor_scale::MILLI,
        }
    }

    pub const fn precision(&self) -> i32 {
        match self {
            SensorKind::Temperature => 6,
            _ => 4,
        }
    }

    /// Encodes a DOM reading as `entPhySensorValue`.
    ///
    /// Power readings are in dBm and reported in mW. Returns `None` for
    /// readings that are not numbers.
    pub fn encode(&self, raw: &str) -> Option<i32> {
        let reading: f64 = raw.trim().parse().ok()?;
        let reading = match self {
            SensorKind::RxPower | SensorKind::TxPower => 10f64.powf(reading / 10.0),
            _ => reading,
        };
        if reading.is_nan() {
            return None;
        }
        let scaled = (reading * 10f64.powi(self.precision())).round();
        Some(scaled.clamp(-SENSOR_VALUE_LIMIT, SENSOR_VALUE_LIMIT) as i32)
    }
}

/// DOM field names and their part id within a transceiver.
const SENSOR_PARTS: [(&str, u32, SensorKind); 14] = [
    ("temperature", 1, SensorKind::Temperature),
    ("voltage", 2, SensorKind::Voltage),
    ("rx1power", 11, SensorKind::RxPower),
    ("tx1bias", 12, SensorKind::TxBias),
    ("tx1power", 13, SensorKind::TxPower),
    ("rx2power", 21, SensorKind::RxPower),
    ("tx2bias", 22, SensorKind::TxBias),
    ("tx2power", 23, SensorKind::TxPower),
    ("rx3power", 31, SensorKind::RxPower),
    ("tx3bias", 32, SensorKind::TxBias),
    ("tx3power", 33, SensorKind::TxPower),
    ("rx4power", 41, SensorKind::RxPower),
    ("tx4bias", 42, SensorKind::TxBias),
    ("tx4power", 43, SensorKind::TxPower),
];

fn sensor_part(name: &str) -> Option<(u32, SensorKind)> {
    SENSOR_PARTS
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|(_, part, kind)| (*part, *kind))
}

pub fn transceiver_sub_id(if_index: u32) -> Option<u32> {
    if_index.checked_mul(1000)
}

pub fn sensor_sub_id(if_index: u32, sensor: &str) -> Option<u32> {
    let (part, _) = sensor_part(sensor)?;
    transceiver_sub_id(if_index)?.checked_add(part)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SensorReading {
    kind: SensorKind,
    value: i32,
}

#[derive(Debug, Default)]
struct SensorSnapshot {
    sensors: BTreeMap<u32, SensorReading>,
    row_ids: Vec<SubId>,
}

pub struct PhysicalSensorUpdater {
    prefix: Oid,
    dbs: NamespaceDbs,
    interfaces: RwLock<Arc<InterfaceMaps>>,
    snapshot: SnapshotCell<SensorSnapshot>,
}

impl PhysicalSensorUpdater {
    pub async fn new(dbs: NamespaceDbs) -> Result<Self> {
        let interfaces = Arc::new(load_interfaces_all(&dbs).await?);
        let updater = Self {
            prefix: Oid::new(SENSOR_PREFIX.to_vec()),
            dbs,
            interfaces: RwLock::new(interfaces),
            snapshot: SnapshotCell::new(),
        };
        updater.refresh().await?;
        Ok(updater)
    }
}

#[async_trait]
impl MibUpdater for PhysicalSensorUpdater {
    fn name(&self) -> &'static str {
        "sensors"
    }

    fn prefix(&self) -> &Oid {
        &self.prefix
    }

    #[instrument(skip_all)]
    async fn refresh(&self) -> Result<()> {
        let guard = self.snapshot.begin_refresh();
        let interfaces = self.interfaces.read().clone();
        let info_prefix = format!("{}{}", STATE_TRANSCEIVER_INFO_TABLE, SEPARATOR_VBAR);
        let keys = self
            .dbs
            .keys(DbId::State, &format!("{}*", info_prefix))
            .await
            .into_partial(STATE_TRANSCEIVER_INFO_TABLE);

        let mut sensors = BTreeMap::new();
        for key in &keys {
            let Some(port) = key.strip_prefix(&info_prefix) else {
                continue;
            };
            let Some(&if_index) = interfaces.index_by_name.get(port) else {
                error!(port, "Transceiver on a port without an ifindex");
                continue;
            };
            let dom = self
                .dbs
                .get_all(
                    DbId::State,
                    &table_key(STATE_TRANSCEIVER_DOM_SENSOR_TABLE, SEPARATOR_VBAR, port),
                )
                .await
                .into_partial(STATE_TRANSCEIVER_DOM_SENSOR_TABLE);

            for (field, raw) in &dom {
                let Some((_, kind)) = sensor_part(field) else {
                    continue;
                };
                let Some(sub_id) = sensor_sub_id(if_index, field) else {
                    continue;
                };
                match kind.encode(raw) {
                    Some(value) => {
                        sensors.insert(sub_id, SensorReading { kind, value });
                    }
                    None => debug!(port, sensor = %field, raw = %raw, "Unparsable sensor reading"),
                }
            }
        }

        let row_ids = sensors.keys().map(|id| vec![*id]).collect();
        debug!(sensors = sensors.len(), "Refreshed transceiver sensors");
        guard.commit(SensorSnapshot { sensors, row_ids });
        Ok(())
    }

    #[instrument(skip_all)]
    async fn reinit(&self) -> Result<()> {
        let interfaces = Arc::new(load_interfaces_all(&self.dbs).await?);
        *self.interfaces.write() = interfaces;
        Ok(())
    }

    fn value_at(&self, sub_id: &[u32]) -> Option<MibValue> {
        let [column, sensor_id] = *sub_id else {
            return None;
        };
        let snap = self.snapshot.load();
        let reading = snap.sensors.get(&sensor_id)?;
        let value = match column {
            1 => reading.kind.data_type(),
            2 => reading.kind.scale(),
            3 => reading.kind.precision(),
            4 => reading.value,
            5 => SENSOR_STATUS_OK,
            _ => return None,
        };
        Some(MibValue::Integer(value))
    }

    fn next(&self, sub_id: &[u32]) -> Option<SubId> {
        next_cell(&SENSOR_COLUMNS, &self.snapshot.load().row_ids, sub_id)
    }

    fn state(&self) -> UpdaterState {
        self.snapshot.state()
    }
}
