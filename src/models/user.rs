use mongodb::bson::oid::ObjectId;

/// Verified identity of the caller, extracted from the bearer token.
///
/// Token issuance lives in the external auth service; this backend only ever
/// sees the decoded subject id.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: ObjectId,
}
