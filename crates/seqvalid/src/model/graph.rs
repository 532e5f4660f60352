//! Quality and other score graphs.

use serde::{Deserialize, Serialize};

use super::location::SeqLoc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteGraph {
    pub max: i32,
    pub min: i32,
    #[serde(default)]
    pub axis: i32,
    pub values: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntGraph {
    pub max: i64,
    pub min: i64,
    #[serde(default)]
    pub axis: i64,
    pub values: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealGraph {
    pub max: f64,
    pub min: f64,
    #[serde(default)]
    pub axis: f64,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphData {
    Byte(ByteGraph),
    Int(IntGraph),
    Real(RealGraph),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeqGraph {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub loc: SeqLoc,
    pub numval: usize,
    pub graph: GraphData,
}

impl SeqGraph {
    pub fn byte(loc: SeqLoc, min: i32, max: i32, values: Vec<u8>) -> Self {
        Self {
            title: Some("Phrap Quality".to_string()),
            loc,
            numval: values.len(),
            graph: GraphData::Byte(ByteGraph {
                max,
                min,
                axis: 0,
                values,
            }),
        }
    }

    pub fn value_count(&self) -> usize {
        match &self.graph {
            GraphData::Byte(g) => g.values.len(),
            GraphData::Int(g) => g.values.len(),
            GraphData::Real(g) => g.values.len(),
        }
    }
}
