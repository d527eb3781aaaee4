//! Lumen Core
//!
//! Foundational primitives for the Lumen UI toolkit:
//!
//! - **Values**: a dynamic [`Value`] type carried by every attribute and event
//! - **Emitters**: priority-ordered, stoppable publish/subscribe
//! - **Observables**: attribute models with change events and cross-model bindings
//! - **State Machines**: flat statecharts for widget interaction states
//! - **Timers**: a clock-driven timer queue and debouncing
//!
//! # Example
//!
//! ```rust
//! use lumen_core::{Observable, Value};
//!
//! let a = Observable::with_attributes([("w", Value::from(2))]);
//! let b = Observable::with_attributes([("h", Value::from(3))]);
//! let area = Observable::new();
//!
//! area.bind(&["value"])
//!     .unwrap()
//!     .to(&a, &["w"])
//!     .unwrap()
//!     .to(&b, &["h"])
//!     .unwrap()
//!     .as_fn(|v| Value::from(v[0].as_i64().unwrap_or(0) * v[1].as_i64().unwrap_or(0)))
//!     .unwrap();
//!
//! b.set("h", 5).unwrap();
//! assert_eq!(area.get("value"), Value::from(10));
//! ```

pub mod emitter;
pub mod error;
pub mod fsm;
pub mod observable;
pub mod timer;
pub mod value;

pub use emitter::{
    Emitter, EmitterId, EventInfo, ListenerId, ListenerRegistry, Priority, Subscription,
    WeakEmitter,
};
pub use error::{ErrorKind, ObservableError, Result};
pub use fsm::{StateMachine, StateMachineBuilder, Transition};
pub use observable::{BindChain, Observable, WeakObservable};
pub use timer::{Clock, Debouncer, ManualClock, SystemClock, TimerId, TimerQueue};
pub use value::{Callback, Value};
