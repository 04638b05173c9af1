use super::Unset;
use crate::table::{FieldMode, FieldType, TableFieldSchema};

/// Typestate builder for [`TableFieldSchema`]. The type has to be picked before
/// the mode, and picking the mode finishes the field.
#[derive(Debug, Clone, PartialEq)]
pub struct TableFieldSchemaBuilder<S, Ty> {
    name: S,
    ty: Ty,
    description: Option<S>,
    fields: Vec<TableFieldSchema<S>>,
}

impl<S> TableFieldSchemaBuilder<S, Unset> {
    pub(crate) const fn new(name: S) -> Self {
        Self {
            name,
            ty: Unset,
            description: None,
            fields: Vec::new(),
        }
    }
}

impl<S, Ty> TableFieldSchemaBuilder<S, Ty> {
    pub fn description(mut self, description: S) -> Self {
        self.description = Some(description);
        self
    }
}

macro_rules! define_ty_builder_fn {
    ($($name:ident($ty_variant:ident)),* $(,)?) => {
        $(
            #[inline]
            pub fn $name(self) -> TableFieldSchemaBuilder<S, FieldType> {
                self.with_type(FieldType::$ty_variant)
            }
        )*
    };
}

impl<S> TableFieldSchemaBuilder<S, Unset> {
    fn with_type(self, ty: FieldType) -> TableFieldSchemaBuilder<S, FieldType> {
        TableFieldSchemaBuilder {
            name: self.name,
            ty,
            description: self.description,
            fields: self.fields,
        }
    }

    define_ty_builder_fn! {
        string(String),
        bytes(Bytes),
        int(Integer),
        float(Float),
        bool(Bool),
        numeric(Numeric),
        geography(Geography),
        json(Json),
        timestamp(Timestamp),
        time(Time),
        date(Date),
        datetime(DateTime),
    }

    /// A nested record with the given sub-fields.
    pub fn record(
        self,
        fields: impl IntoIterator<Item = TableFieldSchema<S>>,
    ) -> TableFieldSchemaBuilder<S, FieldType> {
        let mut builder = self.with_type(FieldType::Record);
        builder.fields.extend(fields);
        builder
    }
}

macro_rules! define_mode_builder_fn {
    ($($name:ident($mode_variant:ident)),* $(,)?) => {
        $(
            #[inline]
            pub fn $name(self) -> TableFieldSchema<S> {
                self.build_with_mode(FieldMode::$mode_variant)
            }
        )*
    };
}

impl<S> TableFieldSchemaBuilder<S, FieldType> {
    fn build_with_mode(self, mode: FieldMode) -> TableFieldSchema<S> {
        TableFieldSchema {
            name: self.name,
            ty: self.ty,
            mode,
            description: self.description,
            fields: self.fields,
        }
    }

    define_mode_builder_fn! {
        required(Required),
        repeated(Repeated),
        nullable(Nullable),
    }
}
