// Copyright 2025 Stoolap Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Columnar batches
//!
//! A [`Column`] stores one value per row. Integer, unsigned, double and
//! decimal columns keep their values unboxed next to a null mask so the
//! arithmetic and comparison kernels can run over plain slices; every
//! other type is kept as a vector of [`Datum`].

use crate::core::{Datum, Decimal, Error, EvalType, FieldType, Result};

/// One column of a batch
#[derive(Debug, Clone)]
pub enum Column {
    Int { values: Vec<i64>, nulls: Vec<bool> },
    UInt { values: Vec<u64>, nulls: Vec<bool> },
    Real { values: Vec<f64>, nulls: Vec<bool> },
    Decimal { values: Vec<Decimal>, nulls: Vec<bool> },
    Datum(Vec<Datum>),
}

impl Default for Column {
    fn default() -> Self {
        Column::Datum(Vec::new())
    }
}

impl Column {
    /// Empty column with the representation `ty` is stored in
    pub fn with_capacity(ty: &FieldType, capacity: usize) -> Self {
        match ty.eval_type() {
            EvalType::Int if ty.is_unsigned() => Column::UInt {
                values: Vec::with_capacity(capacity),
                nulls: Vec::with_capacity(capacity),
            },
            EvalType::Int => Column::Int {
                values: Vec::with_capacity(capacity),
                nulls: Vec::with_capacity(capacity),
            },
            EvalType::Real => Column::Real {
                values: Vec::with_capacity(capacity),
                nulls: Vec::with_capacity(capacity),
            },
            EvalType::Decimal => Column::Decimal {
                values: Vec::with_capacity(capacity),
                nulls: Vec::with_capacity(capacity),
            },
            _ => Column::Datum(Vec::with_capacity(capacity)),
        }
    }

    /// Build a column of type `ty` from datums
    pub fn from_datums(ty: &FieldType, datums: Vec<Datum>) -> Self {
        let mut col = Column::with_capacity(ty, datums.len());
        if matches!(col, Column::Datum(_)) {
            return Column::Datum(datums);
        }
        for d in datums {
            if col.push(d.clone()).is_err() {
                // A value of another representation: fall back to datums
                let mut all = col.into_datums();
                all.push(d);
                return Column::Datum(all);
            }
        }
        col
    }

    /// `rows` copies of `value`
    pub fn constant(ty: &FieldType, value: &Datum, rows: usize) -> Self {
        let mut col = Column::with_capacity(ty, rows);
        for _ in 0..rows {
            if col.push(value.clone()).is_err() {
                return Column::Datum(vec![value.clone(); rows]);
            }
        }
        col
    }

    /// Append a value. Fails when the value does not match a typed column.
    pub fn push(&mut self, value: Datum) -> Result<()> {
        match (self, value) {
            (Column::Int { values, nulls }, Datum::Null) => {
                values.push(0);
                nulls.push(true);
            }
            (Column::Int { values, nulls }, Datum::Int(v)) => {
                values.push(v);
                nulls.push(false);
            }
            (Column::UInt { values, nulls }, Datum::Null) => {
                values.push(0);
                nulls.push(true);
            }
            (Column::UInt { values, nulls }, Datum::UInt(v)) => {
                values.push(v);
                nulls.push(false);
            }
            (Column::Real { values, nulls }, Datum::Null) => {
                values.push(0.0);
                nulls.push(true);
            }
            (Column::Real { values, nulls }, Datum::Float(v)) => {
                values.push(v);
                nulls.push(false);
            }
            (Column::Decimal { values, nulls }, Datum::Null) => {
                values.push(Decimal::ZERO);
                nulls.push(true);
            }
            (Column::Decimal { values, nulls }, Datum::Decimal(v)) => {
                values.push(v);
                nulls.push(false);
            }
            (Column::Datum(values), v) => values.push(v),
            (col, v) => {
                return Err(Error::internal(format!(
                    "cannot store {} in a {} column",
                    v.kind_name(),
                    col.repr_name()
                )))
            }
        }
        Ok(())
    }

    fn repr_name(&self) -> &'static str {
        match self {
            Column::Int { .. } => "int",
            Column::UInt { .. } => "uint",
            Column::Real { .. } => "real",
            Column::Decimal { .. } => "decimal",
            Column::Datum(_) => "datum",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Int { values, .. } => values.len(),
            Column::UInt { values, .. } => values.len(),
            Column::Real { values, .. } => values.len(),
            Column::Decimal { values, .. } => values.len(),
            Column::Datum(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_null(&self, row: usize) -> bool {
        match self {
            Column::Int { nulls, .. }
            | Column::UInt { nulls, .. }
            | Column::Real { nulls, .. }
            | Column::Decimal { nulls, .. } => nulls[row],
            Column::Datum(values) => values[row].is_null(),
        }
    }

    /// Value at `row`
    pub fn get(&self, row: usize) -> Datum {
        if self.is_null(row) {
            return Datum::Null;
        }
        match self {
            Column::Int { values, .. } => Datum::Int(values[row]),
            Column::UInt { values, .. } => Datum::UInt(values[row]),
            Column::Real { values, .. } => Datum::Float(values[row]),
            Column::Decimal { values, .. } => Datum::Decimal(values[row]),
            Column::Datum(values) => values[row].clone(),
        }
    }

    /// Convert into a vector of datums
    pub fn into_datums(self) -> Vec<Datum> {
        match self {
            Column::Datum(values) => values,
            other => (0..other.len()).map(|i| other.get(i)).collect(),
        }
    }

    /// Copy `other` onto the end of this column
    pub fn extend(&mut self, other: Column) -> Result<()> {
        match (&mut *self, other) {
            (Column::Int { values, nulls }, Column::Int { values: v, nulls: n }) => {
                values.extend(v);
                nulls.extend(n);
            }
            (Column::UInt { values, nulls }, Column::UInt { values: v, nulls: n }) => {
                values.extend(v);
                nulls.extend(n);
            }
            (Column::Real { values, nulls }, Column::Real { values: v, nulls: n }) => {
                values.extend(v);
                nulls.extend(n);
            }
            (Column::Decimal { values, nulls }, Column::Decimal { values: v, nulls: n }) => {
                values.extend(v);
                nulls.extend(n);
            }
            (Column::Datum(values), other) => values.extend(other.into_datums()),
            (this, other) => {
                let mut all = std::mem::take(this).into_datums();
                all.extend(other.into_datums());
                *this = Column::Datum(all);
            }
        }
        Ok(())
    }

    /// Rows where any of `columns` is NULL
    pub fn any_null(columns: &[Column], rows: usize) -> Vec<bool> {
        (0..rows)
            .map(|r| columns.iter().any(|c| c.is_null(r)))
            .collect()
    }
}

/// A batch of rows stored column by column
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    columns: Vec<Column>,
    types: Vec<FieldType>,
    rows: usize,
}

impl Chunk {
    /// Build a chunk from equally long columns
    pub fn new(types: Vec<FieldType>, columns: Vec<Column>) -> Result<Self> {
        if types.len() != columns.len() {
            return Err(Error::invalid_argument(format!(
                "{} column types for {} columns",
                types.len(),
                columns.len()
            )));
        }
        let rows = columns.first().map(Column::len).unwrap_or(0);
        if columns.iter().any(|c| c.len() != rows) {
            return Err(Error::invalid_argument("columns differ in length"));
        }
        Ok(Self {
            columns,
            types,
            rows,
        })
    }

    /// Build a chunk from row-major data
    pub fn from_rows(types: Vec<FieldType>, rows: &[Vec<Datum>]) -> Result<Self> {
        let mut columns: Vec<Vec<Datum>> = vec![Vec::with_capacity(rows.len()); types.len()];
        for (r, row) in rows.iter().enumerate() {
            if row.len() != types.len() {
                return Err(Error::invalid_argument(format!(
                    "row {} has {} values, expected {}",
                    r,
                    row.len(),
                    types.len()
                )));
            }
            for (c, value) in row.iter().enumerate() {
                columns[c].push(value.clone());
            }
        }
        let columns = types
            .iter()
            .zip(columns)
            .map(|(ty, data)| Column::from_datums(ty, data))
            .collect();
        Ok(Self {
            columns,
            types,
            rows: rows.len(),
        })
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn column_type(&self, index: usize) -> Option<&FieldType> {
        self.types.get(index)
    }

    /// One row as datums
    pub fn row(&self, index: usize) -> Vec<Datum> {
        self.columns.iter().map(|c| c.get(index)).collect()
    }

    /// Rows `start..end` as a new chunk
    pub fn slice(&self, start: usize, end: usize) -> Chunk {
        let end = end.min(self.rows);
        let start = start.min(end);
        let columns = self
            .columns
            .iter()
            .zip(&self.types)
            .map(|(c, ty)| Column::from_datums(ty, (start..end).map(|i| c.get(i)).collect()))
            .collect();
        Chunk {
            columns,
            types: self.types.clone(),
            rows: end - start,
        }
    }
}
