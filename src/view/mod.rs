
                    /*\
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                   Views
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                    \*/

//! The event contract shared by sources and views.
//!
//! A *source* emits [`CollectionChange`]s describing how its storage changed,
//! a *view* replays them onto its mirror and emits [`ViewChange`]s describing
//! how the visible projection changed. Both sides synchronize on one shared
//! [`SyncRoot`].

pub mod change;
pub mod channel;
pub mod observer;
pub mod source;
pub mod sync_root;
pub mod view_change;

pub use {
    change::{CollectionChange, Items, SortOperation, SortOrder},
    channel::{queue_channel, ChannelReceiver, ChannelSender, EventSink, FnSink},
    observer::{
        ChangeObserver, CountObserver, ObserverList, RejectionObserver, Subscription,
        SubscriptionId, ViewBroadcast, ViewObserver,
    },
    source::ObservableCollection,
    sync_root::SyncRoot,
    view_change::{Rejection, ResetKind, ResetRecord, ViewChange, ViewChangeRecord},
};
