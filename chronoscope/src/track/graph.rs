use std::collections::BTreeMap;

use chronoscope_common::{
    EncodedValue, TimerInfo, VALUE_ENCODING_F32, VALUE_ENCODING_F64, VALUE_ENCODING_I32,
    VALUE_ENCODING_I64, VALUE_ENCODING_U32, VALUE_ENCODING_U64,
};
use log::warn;

use super::TrackCommon;
use crate::domain::{Tick, ValueDecodeError};
use crate::render::{color_for_name, FrameParams, Shape};

/// Decode the raw payload of a value sample into a plottable scalar.
///
/// 32-bit encodings live in the low half of `bits`.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_precision_loss)]
pub fn decode_value(value: &EncodedValue) -> Result<f64, ValueDecodeError> {
    let bits = value.bits;
    match value.encoding {
        VALUE_ENCODING_I32 => Ok(f64::from(bits as u32 as i32)),
        VALUE_ENCODING_I64 => Ok(bits as i64 as f64),
        VALUE_ENCODING_U32 => Ok(f64::from(bits as u32)),
        VALUE_ENCODING_U64 => Ok(bits as f64),
        VALUE_ENCODING_F32 => Ok(f64::from(f32::from_bits(bits as u32))),
        VALUE_ENCODING_F64 => Ok(f64::from_bits(bits)),
        other => Err(ValueDecodeError::UnsupportedEncoding(other)),
    }
}

/// Scalar samples of one named series
#[derive(Debug)]
pub struct GraphTrack {
    pub(crate) common: TrackCommon,
    values: BTreeMap<Tick, f64>,
    min_value: f64,
    max_value: f64,
}

impl GraphTrack {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            common: TrackCommon::new(name, color_for_name(name)),
            values: BTreeMap::new(),
            min_value: f64::INFINITY,
            max_value: f64::NEG_INFINITY,
        }
    }

    /// Decode and store a sample; undecodable samples are logged and dropped
    pub fn on_timer(&mut self, record: &TimerInfo) {
        match self.decode(record) {
            Ok(value) => self.add_value(record.start, value),
            Err(e) => warn!("Dropping sample of {:?} at {}: {}", self.common.name, record.start, e),
        }
    }

    fn decode(&self, record: &TimerInfo) -> Result<f64, ValueDecodeError> {
        let payload =
            record.value.as_ref().ok_or_else(|| ValueDecodeError::MissingPayload(self.common.name.clone()))?;
        decode_value(payload)
    }

    /// Store an already-decoded sample; a later sample at the same tick wins
    pub fn add_value(&mut self, time: Tick, value: f64) {
        if self.values.insert(time, value).is_none() {
            self.common.record(time, time);
        }
        self.min_value = self.min_value.min(value);
        self.max_value = self.max_value.max(value);
    }

    /// Smallest sample seen, `None` while empty
    #[must_use]
    pub fn min_value(&self) -> Option<f64> {
        (!self.values.is_empty()).then_some(self.min_value)
    }

    /// Largest sample seen, `None` while empty
    #[must_use]
    pub fn max_value(&self) -> Option<f64> {
        (!self.values.is_empty()).then_some(self.max_value)
    }

    /// Value in effect at `time`: the latest sample at or before it
    #[must_use]
    pub fn value_at(&self, time: Tick) -> Option<f64> {
        self.values.range(..=time).next_back().map(|(_, v)| *v)
    }

    /// Samples in tick order
    pub fn samples(&self) -> impl Iterator<Item = (Tick, f64)> + '_ {
        self.values.iter().map(|(t, v)| (*t, *v))
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn push_shapes(&self, frame: &FrameParams<'_>, top: f32, out: &mut Vec<Shape>) {
        if self.values.is_empty() {
            return;
        }
        let height = f64::from(frame.layout.graph_track_height);
        let range = self.max_value - self.min_value;
        let y_of = |value: f64| {
            let normalized = if range > 0.0 { (value - self.min_value) / range } else { 0.5 };
            top + (height * (1.0 - normalized)) as f32
        };

        // The sample preceding the range sets the value at the left edge
        let preceding = self.values.range(..frame.min_tick).next_back();
        let visible = self.values.range(frame.min_tick..=frame.max_tick);
        let points: Vec<(f32, f32)> = preceding
            .into_iter()
            .chain(visible)
            .map(|(tick, value)| (frame.mapping.world_x_from_tick(*tick), y_of(*value)))
            .collect();

        if !points.is_empty() {
            out.push(Shape::Polyline { points, color: self.common.color });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackLayout;
    use crate::render::PickingMode;
    use crate::time_mapping::{TimeMapping, TimeWindow, Viewport};
    use chronoscope_common::{ThreadId, VALUE_ENCODING_STRING};

    #[test]
    fn test_decode_every_numeric_encoding() {
        let neg_i32 = EncodedValue { encoding: VALUE_ENCODING_I32, bits: u64::from((-5_i32) as u32) };
        assert_eq!(decode_value(&neg_i32), Ok(-5.0));
        assert_eq!(decode_value(&EncodedValue::from_i64(-7)), Ok(-7.0));
        assert_eq!(decode_value(&EncodedValue { encoding: VALUE_ENCODING_U32, bits: 42 }), Ok(42.0));
        assert_eq!(decode_value(&EncodedValue::from_u64(9)), Ok(9.0));
        let f32_bits = EncodedValue { encoding: VALUE_ENCODING_F32, bits: u64::from(1.5_f32.to_bits()) };
        assert_eq!(decode_value(&f32_bits), Ok(1.5));
        assert_eq!(decode_value(&EncodedValue::from_f64(60.25)), Ok(60.25));
    }

    #[test]
    fn test_decode_rejects_string_and_unknown() {
        let string = EncodedValue { encoding: VALUE_ENCODING_STRING, bits: 3 };
        assert_eq!(decode_value(&string), Err(ValueDecodeError::UnsupportedEncoding(VALUE_ENCODING_STRING)));
        let unknown = EncodedValue { encoding: 99, bits: 0 };
        assert_eq!(decode_value(&unknown), Err(ValueDecodeError::UnsupportedEncoding(99)));
    }

    #[test]
    fn test_bad_samples_are_dropped() {
        let mut track = GraphTrack::new("fps");
        track.on_timer(&TimerInfo::value_sample("fps", 10, ThreadId(1), EncodedValue::from_f64(60.0)));
        track.on_timer(&TimerInfo::value_sample("fps", 20, ThreadId(1), EncodedValue { encoding: 99, bits: 0 }));
        track.on_timer(&TimerInfo::function_span(30, 30, ThreadId(1), 0));
        track.on_timer(&TimerInfo::value_sample("fps", 40, ThreadId(1), EncodedValue::from_f64(30.0)));

        assert_eq!(track.common.num_timers(), 2);
        assert_eq!(track.min_value(), Some(30.0));
        assert_eq!(track.max_value(), Some(60.0));
        assert_eq!(track.value_at(25), Some(60.0));
        assert_eq!(track.value_at(5), None);
    }

    #[test]
    fn test_replaced_sample_is_counted_once() {
        let mut track = GraphTrack::new("fps");
        track.add_value(10, 60.0);
        track.add_value(10, 55.0);
        track.add_value(20, 50.0);

        assert_eq!(track.common.num_timers(), 2);
        assert_eq!(track.value_at(10), Some(55.0));
    }

    #[test]
    fn test_polyline_includes_preceding_sample() {
        let mut track = GraphTrack::new("memory");
        for (t, v) in [(0, 0.0), (50_000, 10.0), (80_000, 5.0), (200_000, 1.0)] {
            track.add_value(t, v);
        }
        let layout = TrackLayout::default();
        let mapping = TimeMapping::new(
            0,
            TimeWindow::new(60.0, 100.0),
            Viewport::new(0.0, 40.0, 0.0, 100.0).unwrap(),
        );
        let frame = FrameParams {
            mapping,
            min_tick: 60_000,
            max_tick: 100_000,
            layout: &layout,
            picking: PickingMode::None,
            selected: None,
        };
        let mut shapes = Vec::new();
        track.push_shapes(&frame, 0.0, &mut shapes);

        let Shape::Polyline { points, .. } = &shapes[0] else { panic!("expected polyline") };
        assert_eq!(points.len(), 2);
        // max value sits at the top of the track
        assert_eq!(points[0].1, 0.0);
        assert_eq!(points[1].0, 20.0);
    }
}
