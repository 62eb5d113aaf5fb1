//! Protobuf messages stored in event files
//!
//! Hand-written `prost` mirrors of the subset of `event.proto`,
//! `summary.proto` and `tensor.proto` that carries scalars. Fields not
//! listed here are skipped by the decoder.

/// `tensorflow.DataType` values that can hold a scalar.
pub mod dtype {
    /// `DT_FLOAT`
    pub const FLOAT: i32 = 1;
    /// `DT_DOUBLE`
    pub const DOUBLE: i32 = 2;
    /// `DT_INT32`
    pub const INT32: i32 = 3;
    /// `DT_INT64`
    pub const INT64: i32 = 9;
}

/// Plugin name TensorBoard attaches to scalar tensor summaries.
pub const SCALARS_PLUGIN: &str = "scalars";

/// One record of an event file.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Event {
    /// Seconds since the Unix epoch.
    #[prost(double, tag = "1")]
    pub wall_time: f64,
    /// Global step.
    #[prost(int64, tag = "2")]
    pub step: i64,
    /// Payload.
    #[prost(oneof = "event::What", tags = "3, 5")]
    pub what: Option<event::What>,
}

/// Nested types of [`Event`].
pub mod event {
    /// Event payload; other payloads (graphs, session logs) are not decoded.
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum What {
        /// Leading record of every file, e.g. `brain.Event:2`.
        #[prost(string, tag = "3")]
        FileVersion(String),
        /// Summary values logged at this step.
        #[prost(message, tag = "5")]
        Summary(super::Summary),
    }
}

/// Collection of tagged values.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Summary {
    /// Tagged values.
    #[prost(message, repeated, tag = "1")]
    pub value: Vec<summary::Value>,
}

/// Nested types of [`Summary`].
pub mod summary {
    /// One tagged value.
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Value {
        /// Tag name.
        #[prost(string, tag = "1")]
        pub tag: String,
        /// Legacy node name, unused by TensorBoard for scalars.
        #[prost(string, tag = "7")]
        pub node_name: String,
        /// Plugin metadata, set on the first occurrence of a tag.
        #[prost(message, optional, tag = "9")]
        pub metadata: Option<super::SummaryMetadata>,
        /// Value payload.
        #[prost(oneof = "Kind", tags = "2, 8")]
        pub kind: Option<Kind>,
    }

    /// Value payloads that can carry a scalar.
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Kind {
        /// TF1 style scalar.
        #[prost(float, tag = "2")]
        SimpleValue(f32),
        /// TF2 style scalar tensor.
        #[prost(message, tag = "8")]
        Tensor(super::TensorProto),
    }
}

/// Metadata attached to a summary value.
#[derive(Clone, PartialEq, prost::Message)]
pub struct SummaryMetadata {
    /// Owning plugin.
    #[prost(message, optional, tag = "1")]
    pub plugin_data: Option<summary_metadata::PluginData>,
    /// Display name.
    #[prost(string, tag = "2")]
    pub display_name: String,
    /// Description.
    #[prost(string, tag = "3")]
    pub summary_description: String,
}

/// Nested types of [`SummaryMetadata`].
pub mod summary_metadata {
    /// Plugin identification.
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct PluginData {
        /// Plugin name, `scalars` for scalar summaries.
        #[prost(string, tag = "1")]
        pub plugin_name: String,
        /// Plugin specific payload.
        #[prost(bytes = "vec", tag = "2")]
        pub content: Vec<u8>,
    }
}

/// Serialized tensor.
#[derive(Clone, PartialEq, prost::Message)]
pub struct TensorProto {
    /// `tensorflow.DataType`.
    #[prost(int32, tag = "1")]
    pub dtype: i32,
    /// Shape; absent or empty means rank 0.
    #[prost(message, optional, tag = "2")]
    pub tensor_shape: Option<TensorShapeProto>,
    /// Little-endian packed content.
    #[prost(bytes = "vec", tag = "4")]
    pub tensor_content: Vec<u8>,
    /// `DT_FLOAT` values.
    #[prost(float, repeated, tag = "5")]
    pub float_val: Vec<f32>,
    /// `DT_DOUBLE` values.
    #[prost(double, repeated, tag = "6")]
    pub double_val: Vec<f64>,
    /// `DT_INT32` values.
    #[prost(int32, repeated, tag = "7")]
    pub int_val: Vec<i32>,
    /// `DT_INT64` values.
    #[prost(int64, repeated, tag = "10")]
    pub int64_val: Vec<i64>,
}

/// Tensor shape.
#[derive(Clone, PartialEq, prost::Message)]
pub struct TensorShapeProto {
    /// Dimensions, outermost first.
    #[prost(message, repeated, tag = "2")]
    pub dim: Vec<tensor_shape_proto::Dim>,
    /// Rank is unknown.
    #[prost(bool, tag = "3")]
    pub unknown_rank: bool,
}

/// Nested types of [`TensorShapeProto`].
pub mod tensor_shape_proto {
    /// One dimension.
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Dim {
        /// Size, -1 when unknown.
        #[prost(int64, tag = "1")]
        pub size: i64,
        /// Optional name.
        #[prost(string, tag = "2")]
        pub name: String,
    }
}

impl TensorProto {
    /// Rank-0 `DT_FLOAT` tensor.
    #[must_use]
    pub fn scalar_f32(value: f32) -> Self {
        Self {
            dtype: dtype::FLOAT,
            tensor_shape: Some(TensorShapeProto::default()),
            float_val: vec![value],
            ..Self::default()
        }
    }

    /// Number of elements, `None` when the rank or a dimension is unknown.
    #[must_use]
    pub fn num_elements(&self) -> Option<i64> {
        let Some(shape) = &self.tensor_shape else {
            return Some(1);
        };
        if shape.unknown_rank {
            return None;
        }
        shape.dim.iter().try_fold(1i64, |acc, dim| {
            (dim.size >= 0).then(|| acc.saturating_mul(dim.size))
        })
    }

    /// The single element as `f64`, if the tensor holds exactly one number.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn scalar(&self) -> Option<f64> {
        if self.num_elements()? != 1 {
            return None;
        }
        match self.dtype {
            dtype::FLOAT => self
                .float_val
                .first()
                .map(|&v| f64::from(v))
                .or_else(|| le_bytes::<4>(&self.tensor_content).map(|b| f64::from(f32::from_le_bytes(b)))),
            dtype::DOUBLE => self
                .double_val
                .first()
                .copied()
                .or_else(|| le_bytes::<8>(&self.tensor_content).map(f64::from_le_bytes)),
            dtype::INT32 => self
                .int_val
                .first()
                .map(|&v| f64::from(v))
                .or_else(|| le_bytes::<4>(&self.tensor_content).map(|b| f64::from(i32::from_le_bytes(b)))),
            dtype::INT64 => self
                .int64_val
                .first()
                .map(|&v| v as f64)
                .or_else(|| le_bytes::<8>(&self.tensor_content).map(|b| i64::from_le_bytes(b) as f64)),
            _ => None,
        }
    }
}

fn le_bytes<const N: usize>(content: &[u8]) -> Option<[u8; N]> {
    content.get(..N)?.try_into().ok()
}

impl summary::Value {
    /// Scalar carried by this value, if any.
    ///
    /// Tensors owned by a plugin other than `scalars` (histograms, text,
    /// hparams) are not scalars even when they hold a single number.
    #[must_use]
    pub fn scalar(&self) -> Option<f64> {
        match self.kind.as_ref()? {
            summary::Kind::SimpleValue(v) => Some(f64::from(*v)),
            summary::Kind::Tensor(tensor) => {
                let plugin = self
                    .metadata
                    .as_ref()
                    .and_then(|m| m.plugin_data.as_ref())
                    .map(|p| p.plugin_name.as_str())
                    .unwrap_or_default();
                if !plugin.is_empty() && plugin != SCALARS_PLUGIN {
                    return None;
                }
                tensor.scalar()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    fn tensor_value(tensor: TensorProto, plugin: &str) -> summary::Value {
        summary::Value {
            tag: "loss".to_string(),
            metadata: Some(SummaryMetadata {
                plugin_data: Some(summary_metadata::PluginData {
                    plugin_name: plugin.to_string(),
                    content: Vec::new(),
                }),
                ..SummaryMetadata::default()
            }),
            kind: Some(summary::Kind::Tensor(tensor)),
            ..summary::Value::default()
        }
    }

    #[test]
    fn test_simple_value_is_scalar() {
        let value = summary::Value {
            tag: "loss".to_string(),
            kind: Some(summary::Kind::SimpleValue(0.5)),
            ..summary::Value::default()
        };
        assert_eq!(value.scalar(), Some(0.5));
    }

    #[test]
    fn test_tensor_content_double() {
        let tensor = TensorProto {
            dtype: dtype::DOUBLE,
            tensor_content: 2.5f64.to_le_bytes().to_vec(),
            ..TensorProto::default()
        };
        assert_eq!(tensor_value(tensor, SCALARS_PLUGIN).scalar(), Some(2.5));
    }

    #[test]
    fn test_histogram_tensor_is_not_scalar() {
        let tensor = TensorProto::scalar_f32(1.0);
        assert_eq!(tensor_value(tensor, "histograms").scalar(), None);
    }

    #[test]
    fn test_vector_tensor_is_not_scalar() {
        let tensor = TensorProto {
            dtype: dtype::FLOAT,
            tensor_shape: Some(TensorShapeProto {
                dim: vec![tensor_shape_proto::Dim {
                    size: 3,
                    name: String::new(),
                }],
                unknown_rank: false,
            }),
            float_val: vec![1.0, 2.0, 3.0],
            ..TensorProto::default()
        };
        assert_eq!(tensor.num_elements(), Some(3));
        assert_eq!(tensor.scalar(), None);
    }

    #[test]
    fn test_event_decodes_after_encode() {
        let event = Event {
            wall_time: 1_700_000_000.0,
            step: 42,
            what: Some(event::What::Summary(Summary {
                value: vec![tensor_value(TensorProto::scalar_f32(0.25), SCALARS_PLUGIN)],
            })),
        };
        let decoded = Event::decode(event.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded.step, 42);
        let Some(event::What::Summary(summary)) = decoded.what else {
            panic!("expected summary payload");
        };
        assert_eq!(summary.value[0].scalar(), Some(0.25));
    }
}
