pub mod cluster;
pub mod key_listing;
pub mod stored_object;

pub use cluster::{
    CsiVolumeSource, ObjectMeta, ObjectReference, PersistentVolume, PersistentVolumeClaim,
    PersistentVolumeClaimSpec, PersistentVolumeSpec, ResourceRequirements,
};
pub use key_listing::KeyListing;
pub use stored_object::StoredObject;
