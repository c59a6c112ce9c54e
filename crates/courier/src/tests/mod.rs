//! Crate-level integration and BDD tests.

use std::sync::{Arc, Mutex};

use crate::cancellation::CancellationToken;
use crate::dispatcher::Dispatcher;
use crate::error::{HandlerResult, RegistryError};
use crate::handler::{NotificationHandler, RequestHandler};
use crate::message::{Capabilities, Notification, Request};
use crate::registry::{Module, Registry};

mod dispatch_behaviour;

#[derive(Debug)]
struct OpenAccount {
    owner: &'static str,
}

impl Request for OpenAccount {
    type Response = u32;
    const CAPABILITIES: Capabilities = Capabilities::RESULT_COMMAND;
}

#[derive(Debug)]
struct AccountOpened {
    id: u32,
}

impl Notification for AccountOpened {}

#[derive(Default)]
struct Accounts {
    opened: Mutex<Vec<&'static str>>,
}

impl RequestHandler<OpenAccount> for Arc<Accounts> {
    fn handle(&self, request: &OpenAccount, token: &CancellationToken) -> HandlerResult<u32> {
        token.check()?;
        let mut opened = self.opened.lock().expect("accounts lock");
        opened.push(request.owner);
        Ok(u32::try_from(opened.len())?)
    }
}

struct Welcome {
    sent: Arc<Mutex<Vec<u32>>>,
}

impl NotificationHandler<AccountOpened> for Welcome {
    fn handle(
        &self,
        notification: &AccountOpened,
        _token: &CancellationToken,
    ) -> HandlerResult<()> {
        self.sent.lock().expect("welcome lock").push(notification.id);
        Ok(())
    }
}

struct AccountsModule {
    accounts: Arc<Accounts>,
    sent: Arc<Mutex<Vec<u32>>>,
}

impl Module for AccountsModule {
    fn register(&self, registry: &mut Registry) -> Result<(), RegistryError> {
        registry.register_handler::<OpenAccount, _>(Arc::clone(&self.accounts))?;
        registry.register_notification_handler::<AccountOpened, _>(Welcome {
            sent: Arc::clone(&self.sent),
        });
        Ok(())
    }
}

#[test]
fn end_to_end_send_then_publish() {
    let accounts = Arc::new(Accounts::default());
    let sent = Arc::new(Mutex::new(Vec::new()));
    let mut registry = Registry::new().with_logging();
    registry
        .install(&AccountsModule {
            accounts: Arc::clone(&accounts),
            sent: Arc::clone(&sent),
        })
        .expect("install accounts module");

    let dispatcher = Dispatcher::new(Arc::new(registry));
    let token = CancellationToken::new();

    let id = dispatcher
        .send(&OpenAccount { owner: "grace" }, &token)
        .expect("open account");
    dispatcher
        .publish(&AccountOpened { id }, &token)
        .expect("publish opened");

    assert_eq!(id, 1);
    assert_eq!(
        accounts.opened.lock().expect("accounts lock").as_slice(),
        ["grace"]
    );
    assert_eq!(sent.lock().expect("welcome lock").as_slice(), [1]);
}
