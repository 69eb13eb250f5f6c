pub mod domain;
pub mod lifecycle;
pub mod pagination;
pub mod ports;

pub use domain::{
    BookedSession, Material, NewMaterial, NewNote, NewReview, NewSession, NewUser, Note,
    PaymentIntent, PaymentIntentRequest, RegistrationFee, Review, Role, Session, SessionStatus,
    User, UserCredentials,
};
pub use lifecycle::{SessionLifecycle, Transition, TransitionOutcome};
pub use pagination::{Page, PageRequest};
pub use ports::{DocumentStore, PaymentService, PortError, PortResult};
