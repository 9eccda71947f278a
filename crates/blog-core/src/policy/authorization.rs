use crate::domain::{Comment, Post, PostEntry, User, Viewer};

/// An entity with a rule for who may edit or delete it.
pub trait Guarded {
    fn modifiable_by(&self, viewer: &Viewer) -> bool;
}

/// Whether `viewer` may mutate `entity`. Anonymous viewers never may.
pub fn can_modify<E: Guarded + ?Sized>(entity: &E, viewer: Option<&Viewer>) -> bool {
    viewer.is_some_and(|v| entity.modifiable_by(v))
}

impl Guarded for Post {
    fn modifiable_by(&self, viewer: &Viewer) -> bool {
        viewer.is(self.author_id) || viewer.is_staff
    }
}

impl Guarded for PostEntry {
    fn modifiable_by(&self, viewer: &Viewer) -> bool {
        self.post.modifiable_by(viewer)
    }
}

impl Guarded for Comment {
    fn modifiable_by(&self, viewer: &Viewer) -> bool {
        viewer.is(self.author_id)
    }
}

impl Guarded for User {
    fn modifiable_by(&self, viewer: &Viewer) -> bool {
        viewer.is(self.id)
    }
}
