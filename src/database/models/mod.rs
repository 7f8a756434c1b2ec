pub mod adult_responsible;
pub mod age_range;
pub mod allergy;
pub mod child;
pub mod class;
pub mod daycare;
pub mod office_manager;
pub mod responsible_of;
pub mod special_instruction;
pub mod user;

pub use adult_responsible::{AdultResponsible, NewResponsibleRow, ResponsiblePatch};
pub use age_range::{AgeRange, AgeRangePatch, NewAgeRange};
pub use allergy::{Allergy, AllergyPatch, NewAllergy};
pub use child::{Child, ChildPatch, NewChild};
pub use class::{Class, ClassPatch, NewClass};
pub use daycare::{Daycare, DaycarePatch, NewDaycare};
pub use office_manager::{OfficeManager, OfficeManagerPatch};
pub use responsible_of::{LinkedChild, LinkedResponsible, ResponsibleOf};
pub use special_instruction::{NewSpecialInstruction, SpecialInstruction, SpecialInstructionPatch};
pub use user::User;
