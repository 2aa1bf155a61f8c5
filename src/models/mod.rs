pub mod document;
pub mod factory;
pub mod follow_up;
pub mod image;
pub mod report_record;

pub use document::{DisplayStatus, Entity as Document, Model as DocumentModel};
pub use factory::{Entity as Factory, Model as FactoryModel};
pub use follow_up::{Entity as FollowUp, Model as FollowUpModel};
pub use image::{Entity as Image, Model as ImageModel};
pub use report_record::{Entity as ReportRecord, Model as ReportRecordModel};
