//! Raw row structs, one per supported table kind.
//!
//! Rows keep column values exactly as stored: heap indices stay indices, simple table indices
//! stay row ids, and coded indices are decoded to [`crate::metadata::token::Token`]s (null
//! references become the default token).

mod declsecurity;
mod event;
mod eventmap;
mod exportedtype;
mod field;
mod genericparam;
mod interfaceimpl;
mod memberref;
mod methoddef;
mod methodimpl;
mod methodspec;
mod nestedclass;
mod property;
mod propertyptr;
mod standalonesig;
mod typedef;
mod typeref;
mod typespec;

pub use declsecurity::DeclSecurityRaw;
pub use event::EventRaw;
pub use eventmap::EventMapRaw;
pub use exportedtype::ExportedTypeRaw;
pub use field::FieldRaw;
pub use genericparam::GenericParamRaw;
pub use interfaceimpl::InterfaceImplRaw;
pub use memberref::MemberRefRaw;
pub use methoddef::MethodDefRaw;
pub use methodimpl::MethodImplRaw;
pub use methodspec::MethodSpecRaw;
pub use nestedclass::NestedClassRaw;
pub use property::PropertyRaw;
pub use propertyptr::PropertyPtrRaw;
pub use standalonesig::StandAloneSigRaw;
pub use typedef::TypeDefRaw;
pub use typeref::TypeRefRaw;
pub use typespec::TypeSpecRaw;
