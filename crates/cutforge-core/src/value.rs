//! Value model for sample entries.
//!
//! Every entry of a [`Sample`](crate::Sample) holds exactly one [`Value`]:
//! a scalar, a homogeneous vector, or a ragged list of optional vectors.
//! The element type is part of the variant, so a stored vector can never
//! mix element types. Dynamic data (for example parsed from an external
//! source) goes through the shape-checked constructors
//! [`Vector::try_from_primitives`] and [`VectorList::try_from_rows`].

use std::fmt;

use crate::error::{Result, SampleError};

/// Element type of a primitive, vector or vector-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Bool,
    Int,
    Float,
    Str,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementType::Bool => "bool",
            ElementType::Int => "int",
            ElementType::Float => "float",
            ElementType::Str => "string",
        };
        f.write_str(name)
    }
}

/// Shape of a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Scalar,
    Vector,
    VectorList,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shape::Scalar => "scalar",
            Shape::Vector => "vector",
            Shape::VectorList => "vector-list",
        };
        f.write_str(name)
    }
}

/// A single primitive value.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Primitive {
    pub fn element_type(&self) -> ElementType {
        match self {
            Primitive::Bool(_) => ElementType::Bool,
            Primitive::Int(_) => ElementType::Int,
            Primitive::Float(_) => ElementType::Float,
            Primitive::Str(_) => ElementType::Str,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Primitive::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Primitive::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Primitive::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view; booleans map to 0.0/1.0, strings have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Primitive::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Primitive::Int(i) => Some(*i as f64),
            Primitive::Float(x) => Some(*x),
            Primitive::Str(_) => None,
        }
    }
}

impl From<bool> for Primitive {
    fn from(v: bool) -> Self {
        Primitive::Bool(v)
    }
}

impl From<i64> for Primitive {
    fn from(v: i64) -> Self {
        Primitive::Int(v)
    }
}

impl From<i32> for Primitive {
    fn from(v: i32) -> Self {
        Primitive::Int(v.into())
    }
}

impl From<f64> for Primitive {
    fn from(v: f64) -> Self {
        Primitive::Float(v)
    }
}

impl From<String> for Primitive {
    fn from(v: String) -> Self {
        Primitive::Str(v)
    }
}

impl From<&str> for Primitive {
    fn from(v: &str) -> Self {
        Primitive::Str(v.to_string())
    }
}

/// An ordered, homogeneously-typed sequence of primitives.
#[derive(Debug, Clone, PartialEq)]
pub enum Vector {
    Bool(Vec<bool>),
    Int(Vec<i64>),
    Float(Vec<f64>),
    Str(Vec<String>),
}

impl Vector {
    /// Builds a vector from dynamically-typed items, rejecting any item
    /// whose type differs from `dtype`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cutforge_core::{ElementType, Primitive, Vector};
    ///
    /// let ok = Vector::try_from_primitives(ElementType::Int, vec![Primitive::Int(1), Primitive::Int(2)]);
    /// assert_eq!(ok.unwrap(), Vector::Int(vec![1, 2]));
    ///
    /// let mixed = Vector::try_from_primitives(ElementType::Int, vec![Primitive::Int(1), Primitive::Float(2.0)]);
    /// assert!(mixed.is_err());
    /// ```
    pub fn try_from_primitives(dtype: ElementType, items: Vec<Primitive>) -> Result<Self> {
        fn collect<T>(
            dtype: ElementType,
            items: Vec<Primitive>,
            pick: impl Fn(Primitive) -> Option<T>,
        ) -> Result<Vec<T>> {
            items
                .into_iter()
                .map(|item| {
                    let found = item.element_type();
                    pick(item).ok_or(SampleError::TypeMismatch {
                        expected: dtype,
                        found,
                    })
                })
                .collect()
        }

        Ok(match dtype {
            ElementType::Bool => Vector::Bool(collect(dtype, items, |p| match p {
                Primitive::Bool(v) => Some(v),
                _ => None,
            })?),
            ElementType::Int => Vector::Int(collect(dtype, items, |p| match p {
                Primitive::Int(v) => Some(v),
                _ => None,
            })?),
            ElementType::Float => Vector::Float(collect(dtype, items, |p| match p {
                Primitive::Float(v) => Some(v),
                _ => None,
            })?),
            ElementType::Str => Vector::Str(collect(dtype, items, |p| match p {
                Primitive::Str(v) => Some(v),
                _ => None,
            })?),
        })
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            Vector::Bool(_) => ElementType::Bool,
            Vector::Int(_) => ElementType::Int,
            Vector::Float(_) => ElementType::Float,
            Vector::Str(_) => ElementType::Str,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Vector::Bool(v) => v.len(),
            Vector::Int(v) => v.len(),
            Vector::Float(v) => v.len(),
            Vector::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric view of the vector. Strings have none.
    pub fn to_f64(&self) -> Option<Vec<f64>> {
        match self {
            Vector::Bool(v) => Some(v.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect()),
            Vector::Int(v) => Some(v.iter().map(|&i| i as f64).collect()),
            Vector::Float(v) => Some(v.clone()),
            Vector::Str(_) => None,
        }
    }
}

/// An ordered sequence of optional vectors sharing one element type.
///
/// Rows may have different lengths; an absent row is `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorList {
    Bool(Vec<Option<Vec<bool>>>),
    Int(Vec<Option<Vec<i64>>>),
    Float(Vec<Option<Vec<f64>>>),
    Str(Vec<Option<Vec<String>>>),
}

impl VectorList {
    /// Builds a vector-list from dynamically-typed rows, rejecting any
    /// element whose type differs from `dtype`.
    pub fn try_from_rows(dtype: ElementType, rows: Vec<Option<Vec<Primitive>>>) -> Result<Self> {
        let mut vectors = Vec::with_capacity(rows.len());
        for row in rows {
            vectors.push(match row {
                Some(items) => Some(Vector::try_from_primitives(dtype, items)?),
                None => None,
            });
        }
        Ok(Self::from_vectors(dtype, vectors))
    }

    // Rows were already checked against `dtype`.
    fn from_vectors(dtype: ElementType, rows: Vec<Option<Vector>>) -> Self {
        macro_rules! unpack {
            ($variant:ident) => {
                VectorList::$variant(
                    rows.into_iter()
                        .map(|row| match row {
                            Some(Vector::$variant(v)) => Some(v),
                            _ => None,
                        })
                        .collect(),
                )
            };
        }
        match dtype {
            ElementType::Bool => unpack!(Bool),
            ElementType::Int => unpack!(Int),
            ElementType::Float => unpack!(Float),
            ElementType::Str => unpack!(Str),
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            VectorList::Bool(_) => ElementType::Bool,
            VectorList::Int(_) => ElementType::Int,
            VectorList::Float(_) => ElementType::Float,
            VectorList::Str(_) => ElementType::Str,
        }
    }

    /// Number of rows, absent rows included.
    pub fn len(&self) -> usize {
        match self {
            VectorList::Bool(v) => v.len(),
            VectorList::Int(v) => v.len(),
            VectorList::Float(v) => v.len(),
            VectorList::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row lengths, with `-1` for absent rows.
    pub fn lengths(&self) -> Vec<i64> {
        fn lens<T>(rows: &[Option<Vec<T>>]) -> Vec<i64> {
            rows.iter()
                .map(|row| row.as_ref().map_or(-1, |v| v.len() as i64))
                .collect()
        }
        match self {
            VectorList::Bool(v) => lens(v),
            VectorList::Int(v) => lens(v),
            VectorList::Float(v) => lens(v),
            VectorList::Str(v) => lens(v),
        }
    }

    /// Returns row `index` as a [`Vector`], `None` if absent or out of range.
    pub fn row(&self, index: usize) -> Option<Vector> {
        match self {
            VectorList::Bool(v) => v.get(index)?.clone().map(Vector::Bool),
            VectorList::Int(v) => v.get(index)?.clone().map(Vector::Int),
            VectorList::Float(v) => v.get(index)?.clone().map(Vector::Float),
            VectorList::Str(v) => v.get(index)?.clone().map(Vector::Str),
        }
    }
}

/// A stored value of any shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Primitive),
    Vector(Vector),
    VectorList(VectorList),
}

impl Value {
    pub fn shape(&self) -> Shape {
        match self {
            Value::Scalar(_) => Shape::Scalar,
            Value::Vector(_) => Shape::Vector,
            Value::VectorList(_) => Shape::VectorList,
        }
    }
}

impl From<Primitive> for Value {
    fn from(p: Primitive) -> Self {
        Value::Scalar(p)
    }
}

impl From<Vector> for Value {
    fn from(v: Vector) -> Self {
        Value::Vector(v)
    }
}

impl From<VectorList> for Value {
    fn from(v: VectorList) -> Self {
        Value::VectorList(v)
    }
}

macro_rules! impl_typed_from {
    ($t:ty, $variant:ident) => {
        impl From<Vec<$t>> for Vector {
            fn from(v: Vec<$t>) -> Self {
                Vector::$variant(v)
            }
        }

        impl From<Vec<Option<Vec<$t>>>> for VectorList {
            fn from(v: Vec<Option<Vec<$t>>>) -> Self {
                VectorList::$variant(v)
            }
        }

        impl From<Vec<Vec<$t>>> for VectorList {
            fn from(v: Vec<Vec<$t>>) -> Self {
                VectorList::$variant(v.into_iter().map(Some).collect())
            }
        }
    };
}

impl_typed_from!(bool, Bool);
impl_typed_from!(i64, Int);
impl_typed_from!(f64, Float);
impl_typed_from!(String, Str);

impl From<Vec<&str>> for Vector {
    fn from(v: Vec<&str>) -> Self {
        Vector::Str(v.into_iter().map(str::to_string).collect())
    }
}
