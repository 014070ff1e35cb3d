/// Backend primary key of a livestock listing.
pub type ListingId = uuid::Uuid;

/// Backend primary key of a stored media asset.
pub type MediaId = uuid::Uuid;

/// Backend primary key of a category.
pub type CategoryId = uuid::Uuid;

/// Backend primary key of a tag.
pub type TagId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
