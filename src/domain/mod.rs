mod email_address;
mod entity;
mod list_member;
mod mail_chimp_list;
mod member_status;
// allow external `use` statements to skip `list_member` etc
pub use email_address::EmailAddress;
pub use entity::merge_submission;
pub use entity::parse_fields;
pub use entity::FieldName;
pub use entity::MailChimpEntity;
pub use list_member::ListMember;
pub use list_member::Location;
pub use list_member::MemberFields;
pub use mail_chimp_list::CampaignDefaults;
pub use mail_chimp_list::Contact;
pub use mail_chimp_list::ListFields;
pub use mail_chimp_list::MailChimpList;
pub use member_status::EmailType;
pub use member_status::MemberStatus;
