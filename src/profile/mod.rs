//! Aircraft profiles: the persisted YAML shape, selection and storage.

pub mod schema;
pub mod selector;
pub mod slots;
pub mod store;

pub use schema::{
    ButtonProfile, Command, ConditionProfile, DataProfile, Dataref, DatarefCondition,
    KnobProfile, LedProfile, Metadata, Profile,
};
pub use selector::{merge_selectors, normalize, select_profile};
pub use slots::{ButtonId, GateId, KnobId, LedId, StepId};
pub use store::{ProfileStore, ProfilesStatus, TEMPLATE_FILE, profile_files, read_profile};
