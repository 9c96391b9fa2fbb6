//! # Document store actor
//!
//! One actor owns every table. Callers send it transaction closures over an
//! mpsc channel; the actor runs each closure to completion before reading
//! the next message, so transactions are serializable without locks.
//!
//! Writes inside a closure are journaled by the tables. When the closure
//! returns `Ok` the journals are cleared (commit); on `Err` they are replayed
//! backwards (abort) and nothing the closure did survives.

use std::any::Any;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

use crate::actor_framework::{Entity, Table};
use crate::domain::{Order, Product, User, UserVoucher, Voucher};
use crate::error::StoreError;

// =============================================================================
// TABLES
// =============================================================================

#[derive(Debug, Default)]
pub struct Tables {
    users: Table<User>,
    products: Table<Product>,
    orders: Table<Order>,
    vouchers: Table<Voucher>,
    reservations: Table<UserVoucher>,
}

/// Typed access to the table holding `T`.
pub trait HasTable<T: Entity> {
    fn table(&self) -> &Table<T>;
    fn table_mut(&mut self) -> &mut Table<T>;
}

macro_rules! has_table {
    ($entity:ty => $field:ident) => {
        impl HasTable<$entity> for Tables {
            fn table(&self) -> &Table<$entity> {
                &self.$field
            }
            fn table_mut(&mut self) -> &mut Table<$entity> {
                &mut self.$field
            }
        }
    };
}

has_table!(User => users);
has_table!(Product => products);
has_table!(Order => orders);
has_table!(Voucher => vouchers);
has_table!(UserVoucher => reservations);

impl Tables {
    fn commit(&mut self) {
        self.users.commit();
        self.products.commit();
        self.orders.commit();
        self.vouchers.commit();
        self.reservations.commit();
    }

    fn rollback(&mut self) {
        self.users.rollback();
        self.products.rollback();
        self.orders.rollback();
        self.vouchers.rollback();
        self.reservations.rollback();
    }
}

// =============================================================================
// TRANSACTION
// =============================================================================

/// Handle given to a transaction closure. Every method is one statement of
/// the enclosing all-or-nothing transaction.
pub struct Transaction<'a> {
    tables: &'a mut Tables,
}

impl Transaction<'_> {
    /// Reads a row by id; a missing row is an error.
    pub fn get<T: Entity>(&self, id: &str) -> Result<T, StoreError>
    where
        Tables: HasTable<T>,
    {
        self.find(id).ok_or_else(|| StoreError::NotFound {
            collection: T::PREFIX,
            id: id.to_string(),
        })
    }

    pub fn find<T: Entity>(&self, id: &str) -> Option<T>
    where
        Tables: HasTable<T>,
    {
        self.tables.table().get(id).cloned()
    }

    pub fn find_first<T: Entity>(&self, predicate: impl Fn(&T) -> bool) -> Option<T>
    where
        Tables: HasTable<T>,
    {
        self.tables.table().find_first(predicate).cloned()
    }

    pub fn create<T: Entity>(&mut self, payload: T::CreatePayload) -> Result<String, StoreError>
    where
        Tables: HasTable<T>,
    {
        self.tables.table_mut().create(payload)
    }

    pub fn update<T: Entity>(&mut self, id: &str, patch: T::Patch) -> Result<T, StoreError>
    where
        Tables: HasTable<T>,
    {
        self.tables.table_mut().update(id, patch)
    }

    pub fn delete<T: Entity>(&mut self, id: &str) -> Result<T, StoreError>
    where
        Tables: HasTable<T>,
    {
        self.tables.table_mut().delete(id)
    }

    /// Runs a domain action (counter change, conditional transition) on a row.
    pub fn apply<T: Entity>(&mut self, id: &str, action: T::Action) -> Result<T::ActionResult, StoreError>
    where
        Tables: HasTable<T>,
    {
        self.tables.table_mut().apply(id, action)
    }
}

pub type TxOutput = Box<dyn Any + Send>;
pub type TxBody = Box<dyn FnOnce(&mut Transaction<'_>) -> Result<TxOutput, StoreError> + Send>;
pub type Response<T> = oneshot::Sender<Result<T, StoreError>>;

/// Runs `body` against `tables`, committing on success and undoing every
/// write on failure.
pub fn execute(tables: &mut Tables, body: TxBody) -> Result<TxOutput, StoreError> {
    let outcome = body(&mut Transaction { tables: &mut *tables });
    match outcome {
        Ok(output) => {
            tables.commit();
            Ok(output)
        }
        Err(e) => {
            tables.rollback();
            Err(e)
        }
    }
}

// =============================================================================
// MESSAGES
// =============================================================================

pub enum StoreRequest {
    Transaction {
        body: TxBody,
        respond_to: Response<TxOutput>,
    },
    Shutdown,
}

// =============================================================================
// ACTOR
// =============================================================================

pub struct StoreActor {
    receiver: mpsc::Receiver<StoreRequest>,
    tables: Tables,
}

impl StoreActor {
    pub fn new(buffer_size: usize) -> (Self, StoreClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            tables: Tables::default(),
        };
        (actor, StoreClient::new(sender))
    }

    #[instrument(name = "store", skip(self))]
    pub async fn run(mut self) {
        info!("Store starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Transaction { body, respond_to } => {
                    let result = execute(&mut self.tables, body);
                    if let Err(e) = &result {
                        debug!(error = %e, "Transaction aborted");
                    }
                    if respond_to.send(result).is_err() {
                        warn!("Transaction caller went away before the reply");
                    }
                }
                StoreRequest::Shutdown => {
                    info!("Store shutting down");
                    break;
                }
            }
        }
        info!("Store stopped");
    }
}

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Clone)]
pub struct StoreClient {
    sender: mpsc::Sender<StoreRequest>,
}

impl StoreClient {
    pub fn new(sender: mpsc::Sender<StoreRequest>) -> Self {
        Self { sender }
    }

    /// Runs `body` as one transaction inside the store actor.
    pub async fn transaction<R, F>(&self, body: F) -> Result<R, StoreError>
    where
        R: Send + 'static,
        F: FnOnce(&mut Transaction<'_>) -> Result<R, StoreError> + Send + 'static,
    {
        let (respond_to, response) = oneshot::channel();
        let body: TxBody = Box::new(move |tx: &mut Transaction<'_>| {
            body(tx).map(|value| Box::new(value) as TxOutput)
        });
        self.sender
            .send(StoreRequest::Transaction { body, respond_to })
            .await
            .map_err(|_| StoreError::Unavailable("store closed".to_string()))?;

        let output = response
            .await
            .map_err(|_| StoreError::Unavailable("store dropped the request".to_string()))??;
        output
            .downcast::<R>()
            .map(|value| *value)
            .map_err(|_| StoreError::Internal("transaction output type mismatch".to_string()))
    }

    pub async fn get<T: Entity>(&self, id: String) -> Result<Option<T>, StoreError>
    where
        Tables: HasTable<T>,
    {
        self.transaction(move |tx| Ok(tx.find::<T>(&id))).await
    }

    pub async fn find_first<T, P>(&self, predicate: P) -> Result<Option<T>, StoreError>
    where
        T: Entity,
        Tables: HasTable<T>,
        P: Fn(&T) -> bool + Send + 'static,
    {
        self.transaction(move |tx| Ok(tx.find_first::<T>(predicate))).await
    }

    pub async fn create<T: Entity>(&self, payload: T::CreatePayload) -> Result<String, StoreError>
    where
        Tables: HasTable<T>,
        T::CreatePayload: 'static,
    {
        self.transaction(move |tx| tx.create::<T>(payload)).await
    }

    pub async fn perform_action<T: Entity>(&self, id: String, action: T::Action) -> Result<T::ActionResult, StoreError>
    where
        Tables: HasTable<T>,
        T::Action: 'static,
        T::ActionResult: 'static,
    {
        self.transaction(move |tx| tx.apply::<T>(&id, action)).await
    }

    pub async fn shutdown(&self) -> Result<(), StoreError> {
        self.sender
            .send(StoreRequest::Shutdown)
            .await
            .map_err(|_| StoreError::Unavailable("store closed".to_string()))
    }
}
