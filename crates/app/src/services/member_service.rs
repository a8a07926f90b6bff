//! Member service: registration and the status write path.

use presence_domain::error::{NotFoundError, PresenceError};
use presence_domain::event::PresenceEvent;
use presence_domain::id::MemberId;
use presence_domain::member::Member;
use presence_domain::status::{Status, UpdateOrigin};

use crate::ports::{EventPublisher, MemberRepository};

/// Outcome of a single status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusWrite {
    pub before: Status,
    pub after: Status,
}

impl StatusWrite {
    /// Whether the stored value actually changed.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.before != self.after
    }
}

/// Store `status` on a member and publish [`PresenceEvent::MemberStatusChanged`]
/// when the value differs from the stored one.
///
/// The origin flag is written every time, even when the status is unchanged.
///
/// # Errors
///
/// Returns [`PresenceError::NotFound`] when the member does not exist, or a
/// storage error from the repository.
pub async fn write_status<R, P>(
    repo: &R,
    publisher: &P,
    member_id: MemberId,
    status: Status,
    origin: UpdateOrigin,
) -> Result<StatusWrite, PresenceError>
where
    R: MemberRepository,
    P: EventPublisher,
{
    let before = repo
        .set_status(member_id, status, origin)
        .await?
        .ok_or_else(|| NotFoundError {
            entity: "Member",
            id: member_id.to_string(),
        })?;
    let write = StatusWrite {
        before,
        after: status,
    };
    if write.changed() {
        let event = PresenceEvent::MemberStatusChanged {
            member_id,
            before,
            after: status,
        };
        if let Err(err) = publisher.publish(event).await {
            tracing::warn!(%member_id, error = ?err, "status change not published");
        }
    }
    Ok(write)
}

/// Application service for members.
pub struct MemberService<R, P> {
    repo: R,
    publisher: P,
}

impl<R: MemberRepository, P: EventPublisher> MemberService<R, P> {
    /// Create a new service backed by the given repository and publisher.
    pub fn new(repo: R, publisher: P) -> Self {
        Self { repo, publisher }
    }

    /// Register a new member after validating domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, member), fields(member_id = %member.id))]
    pub async fn create_member(&self, member: Member) -> Result<Member, PresenceError> {
        member.validate()?;
        self.repo.create(member).await
    }

    /// Look up a member by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError::NotFound`] when no member with `id` exists,
    /// or a storage error from the repository.
    pub async fn get_member(&self, id: MemberId) -> Result<Member, PresenceError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Member",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all members.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_members(&self) -> Result<Vec<Member>, PresenceError> {
        self.repo.get_all().await
    }

    /// Set a member's status on behalf of a person (the manual path).
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError::NotFound`] when the member does not exist, or
    /// a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn set_status(
        &self,
        id: MemberId,
        status: Status,
        origin: UpdateOrigin,
    ) -> Result<Member, PresenceError> {
        let write = write_status(&self.repo, &self.publisher, id, status, origin).await?;
        tracing::info!(before = %write.before, after = %write.after, "member status written");
        self.get_member(id).await
    }

    /// Delete a member by id.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_member(&self, id: MemberId) -> Result<(), PresenceError> {
        self.repo.delete(id).await
    }
}
