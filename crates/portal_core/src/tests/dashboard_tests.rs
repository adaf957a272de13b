use super::*;
use crate::{
    events::Navigation,
    session::LOGIN_PATH,
    test_support::{account, harness, ApiCall, FakePortalApi},
};

#[test]
fn composition_follows_role() {
    let h = harness(FakePortalApi::new());

    let user = RoleDashboard::for_role(h.ctx.clone(), Role::User).expect("user");
    assert!(user.media.is_some() && user.subscription.is_none() && user.admin.is_none());

    let subscriber = RoleDashboard::for_role(h.ctx.clone(), Role::Subscriber).expect("subscriber");
    assert!(subscriber.media.is_some() && subscriber.subscription.is_some());
    assert!(subscriber.admin.is_none());

    let admin = RoleDashboard::for_role(h.ctx.clone(), Role::Admin).expect("admin");
    assert!(admin.media.is_none());
    assert!(admin.subscription.is_some() && admin.admin.is_some());

    assert!(RoleDashboard::for_role(h.ctx.clone(), Role::Unknown("guest".into())).is_none());
}

#[test]
fn route_selects_dashboard() {
    let h = harness(FakePortalApi::new());
    let picked = |path: &str| {
        RoleDashboard::for_route(h.ctx.clone(), path).map(|dashboard| dashboard.role().clone())
    };

    assert_eq!(picked("/admin"), Some(Role::Admin));
    assert_eq!(picked("/static/subscriber.html"), Some(Role::Subscriber));
    assert_eq!(picked("/user?tab=avatars"), Some(Role::User));
    assert_eq!(picked("/login"), None);
}

#[tokio::test]
async fn user_init_loads_profile_and_media() {
    let h = harness(FakePortalApi::new().with_avatars(&["avatars/a.png"]));
    let mut dashboard = RoleDashboard::for_role(h.ctx.clone(), Role::User).expect("user");

    let report = dashboard.init().await;

    assert!(report.is_clean());
    assert!(report.accounts.is_none());
    let mut calls = h.api.calls();
    calls.sort_by_key(|call| call.endpoint());
    assert_eq!(
        calls,
        vec![
            ApiCall::FetchProfile,
            ApiCall::ListAnimations,
            ApiCall::ListAvatars
        ]
    );
    let media = dashboard.media.as_ref().expect("media");
    assert_eq!(media.avatars.items().len(), 1);
    assert!(dashboard.profile.view().is_some());
}

#[tokio::test]
async fn admin_init_failures_do_not_block_other_loads() {
    let api = FakePortalApi::new()
        .with_profile(account(3, "Root", "root@portal.io", Role::Admin))
        .with_accounts(vec![account(1, "Ana Lee", "ana@x.com", Role::User)]);
    let h = harness(api);
    h.api.fail("fetch_profile", PortalError::transport("Profile load", "timed out"));
    let mut dashboard = RoleDashboard::for_role(h.ctx.clone(), Role::Admin).expect("admin");

    let report = dashboard.init().await;

    assert_eq!(report.failures().len(), 1);
    assert!(matches!(report.accounts, Some(Ok(()))));
    assert_eq!(
        dashboard.admin.as_ref().map(|admin| admin.accounts().len()),
        Some(1)
    );
}

#[tokio::test]
async fn media_suite_generation_feeds_history() {
    let h = harness(FakePortalApi::new());
    let mut media = MediaSuite::new(h.ctx.clone());

    media.generate("3", "happy").await.expect("generated");
    assert_eq!(media.animations.items().len(), 1);
    assert!(media.job.preview().is_some());
}

#[tokio::test]
async fn subscription_plan_must_be_chosen() {
    let h = harness(FakePortalApi::new());
    let dashboard = RoleDashboard::for_role(h.ctx.clone(), Role::Subscriber).expect("subscriber");
    let plans = dashboard.subscription.as_ref().expect("plans");

    assert!(plans.change_plan(" ").await.is_err());
    assert!(h.api.calls().is_empty());
    plans.change_plan("premium").await.expect("changed");
    assert_eq!(
        h.api.calls(),
        vec![ApiCall::UpdateSubscription {
            plan: "premium".to_string()
        }]
    );
}

#[tokio::test]
async fn logout_redirects_only_on_success() {
    let h = harness(FakePortalApi::new());
    let dashboard = RoleDashboard::for_role(h.ctx.clone(), Role::User).expect("user");

    assert_eq!(
        dashboard.session.logout().await,
        Some(Navigation::immediate(LOGIN_PATH))
    );

    h.api.fail("logout", PortalError::transport("Logout", "connection refused"));
    assert_eq!(dashboard.session.logout().await, None);
    assert!(h.notifier.notices().is_empty());
}
