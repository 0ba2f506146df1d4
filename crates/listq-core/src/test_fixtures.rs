use crate::{
    ID_COLUMN,
    model::{ColumnModel, EntityModel, FieldModel, ModelRegistry},
    value::ValueType,
};

pub(crate) const PEOPLE_TYPE: &str = "0x0100A1";
pub(crate) const EMPLOYEE_TYPE: &str = "0x0100A101";
pub(crate) const DOCUMENT_TYPE: &str = "0x0101";

fn person_fields(entity: EntityModel) -> EntityModel {
    entity
        .field(FieldModel::new("Id", ValueType::Counter).column(ID_COLUMN))
        .field(FieldModel::new("Age", ValueType::Integer))
        .field(FieldModel::new("Name", ValueType::Text).nullable())
        .field(FieldModel::new("Active", ValueType::Boolean))
        .field(FieldModel::new("Tags", ValueType::MultiChoice).nullable())
        .field(FieldModel::new("Category", ValueType::Choice).nullable())
        .field(FieldModel::new("Author", ValueType::User).nullable())
        .field(FieldModel::new("Created", ValueType::DateTime).nullable())
        .field(
            FieldModel::new("Birthday", ValueType::DateTime)
                .nullable()
                .date_only(),
        )
        .field(FieldModel::new("Region", ValueType::Taxonomy).nullable())
        .field(FieldModel::new("Notes", ValueType::Note).nullable().not_queryable())
        .field(
            FieldModel::mapped(
                "Owner",
                ValueType::User,
                vec![
                    ColumnModel::new("PersonOwner", ValueType::User),
                    ColumnModel::new("DeptOwner", ValueType::User),
                ],
            )
            .nullable(),
        )
}

/// Registry shared by translator, cache and engine tests.
pub(crate) fn registry() -> ModelRegistry {
    ModelRegistry::new()
        .with(person_fields(EntityModel::new("People").content_type(PEOPLE_TYPE)))
        .with(
            person_fields(EntityModel::new("Employees").content_type(EMPLOYEE_TYPE))
                .field(FieldModel::new("Salary", ValueType::Number).column("EmpSalary")),
        )
        .with(
            EntityModel::new("Documents")
                .content_type(DOCUMENT_TYPE)
                .field(FieldModel::new("Id", ValueType::Counter).column(ID_COLUMN))
                .field(FieldModel::new("Title", ValueType::Text).nullable()),
        )
        .with(
            EntityModel::new("Items")
                .field(FieldModel::new("Id", ValueType::Counter).column(ID_COLUMN))
                .field(FieldModel::new("Title", ValueType::Text).nullable()),
        )
}
