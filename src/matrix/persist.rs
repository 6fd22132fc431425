//! JSON persistence for matrices.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use super::solve::{arrangement_of, permutation_from_arrangement};
use super::{Element, ElementKind, Factorization, FactorizationKind, Matrix};
use crate::error::{RabinError, Result};

/// Serialized form of a [`Matrix`]: kind, shape, factorization state and the
/// column-major buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixRecord<T> {
    pub kind: ElementKind,
    pub rows: usize,
    pub columns: usize,
    pub factorization: FactorizationKind,
    /// Row arrangement of an LU factorization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permutation: Option<Vec<usize>>,
    pub data: Vec<T>,
}

impl<T: Element> Matrix<T> {
    /// Snapshot as a record.
    pub fn to_record(&self) -> MatrixRecord<T> {
        let permutation = match &self.factorization {
            Factorization::Lu(p) => Some(arrangement_of(p, self.rows())),
            _ => None,
        };
        MatrixRecord {
            kind: T::KIND,
            rows: self.rows(),
            columns: self.columns(),
            factorization: self.factorization(),
            permutation,
            data: self.data.as_slice().to_vec(),
        }
    }

    /// Rebuild from a record, checking its consistency.
    pub fn from_record(record: MatrixRecord<T>) -> Result<Self> {
        if record.kind != T::KIND {
            return Err(RabinError::record(format!(
                "expected {:?} elements, found {:?}",
                T::KIND,
                record.kind
            )));
        }
        if record.data.len() != record.rows * record.columns {
            return Err(RabinError::record(format!(
                "{}x{} matrix needs {} values, found {}",
                record.rows,
                record.columns,
                record.rows * record.columns,
                record.data.len()
            )));
        }

        let factorization = match (record.factorization, record.permutation) {
            (FactorizationKind::None, None) => Factorization::None,
            (FactorizationKind::Cholesky, None) => Factorization::Cholesky,
            (FactorizationKind::Lu, Some(arrangement)) if arrangement.len() == record.rows => {
                Factorization::Lu(permutation_from_arrangement(&arrangement)?)
            }
            (kind, permutation) => {
                return Err(RabinError::record(format!(
                    "factorization {:?} with permutation {:?}",
                    kind, permutation
                )))
            }
        };

        Ok(Self {
            data: DMatrix::from_vec(record.rows, record.columns, record.data),
            factorization,
        })
    }

    /// Encode as JSON.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_record())?)
    }

    /// Decode from JSON produced by [`encode`](Self::encode).
    pub fn decode(json: &str) -> Result<Self> {
        let record: MatrixRecord<T> = serde_json::from_str(json)?;
        Self::from_record(record)
    }
}
