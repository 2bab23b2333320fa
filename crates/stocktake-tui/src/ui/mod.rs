pub(crate) mod count_worker;
pub(crate) mod input_field;
pub(crate) mod items_table;
pub(crate) mod modal;
pub(crate) mod text;
