//! End-to-end cycles over in-memory stores and a manual clock.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};

use pharmaflow_core::{BranchId, ManualClock, PlanId, ProductId, UserId};
use pharmaflow_eventlog::{EventLogStore, InMemoryEventLog, record_kind};
use pharmaflow_inventory::InMemoryInventory;
use pharmaflow_notify::{
    BranchInfo, InMemoryDirectory, InMemoryNotificationJobs, NotificationJobStore,
    NotificationStage, RecordingGateway, RenewalPlan, ShippingMethod,
};

use crate::config::EngineConfig;
use crate::dispatch::DispatchLoop;

const PLAN: PlanId = PlanId::new(1);
const USER: UserId = UserId::new(7);
const PRODUCT: ProductId = ProductId::new(10);
const BRANCH: BranchId = BranchId::new(4);

struct Fixture {
    jobs: Arc<InMemoryNotificationJobs>,
    directory: Arc<InMemoryDirectory>,
    inventory: Arc<InMemoryInventory>,
    gateway: Arc<RecordingGateway>,
    audit: Arc<InMemoryEventLog>,
    clock: Arc<ManualClock>,
    dispatch: DispatchLoop<
        Arc<InMemoryNotificationJobs>,
        Arc<InMemoryDirectory>,
        Arc<InMemoryDirectory>,
        Arc<InMemoryInventory>,
        Arc<InMemoryDirectory>,
        Arc<RecordingGateway>,
        Arc<InMemoryEventLog>,
    >,
}

fn fixture() -> Fixture {
    let jobs = InMemoryNotificationJobs::arc();
    let directory = InMemoryDirectory::arc();
    let inventory = InMemoryInventory::arc();
    let gateway = RecordingGateway::arc();
    let audit = InMemoryEventLog::arc();
    let clock = ManualClock::arc(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

    directory.set_user_email(USER, "customer@example.com");
    directory.upsert_branch(BranchInfo {
        id: BRANCH,
        name: "Seef Mall".to_string(),
        city: Some("Seef".to_string()),
    });
    directory.set_branch_city(BRANCH, "Seef");

    let dispatch = DispatchLoop::new(
        jobs.clone(),
        directory.clone(),
        directory.clone(),
        inventory.clone(),
        directory.clone(),
        gateway.clone(),
        audit.clone(),
        clock.clone(),
        10,
        29,
    );

    Fixture {
        jobs,
        directory,
        inventory,
        gateway,
        audit,
        clock,
        dispatch,
    }
}

fn pickup_plan(approved_quantity: i64) -> RenewalPlan {
    RenewalPlan {
        id: PLAN,
        user_id: USER,
        prescription_name: Some("Metformin 500mg".to_string()),
        approved_product_id: Some(PRODUCT),
        approved_product_name: Some("Metformin Hydrochloride".to_string()),
        approved_quantity,
        shipping: ShippingMethod::Pickup { branch_id: BRANCH },
    }
}

fn schedule(f: &Fixture, creation_local: NaiveDate) {
    let scheduler = EngineConfig::default().scheduler(f.jobs.clone());
    scheduler.schedule_for_plan(PLAN, USER, creation_local).unwrap();
}

/// Plan created 2024-01-01 local; dispatch at local 2024-01-02 00:05 with
/// covering stock sends exactly the first job.
#[test]
fn monthly_cycle_sends_only_the_first_due_job() {
    let f = fixture();
    f.directory.upsert_plan(pickup_plan(10));
    f.inventory.set_stock(PRODUCT, BRANCH, 100);
    schedule(&f, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

    // Local 2024-01-02 00:05 in Bahrain (UTC+3) is 2024-01-01 21:05 UTC.
    f.clock.set(Utc.with_ymd_and_hms(2024, 1, 1, 21, 5, 0).unwrap());
    let report = f.dispatch.run_cycle();

    assert_eq!(report.due, 1);
    assert_eq!(report.sent, 1);
    assert_eq!(f.gateway.sent_count(), 1);
    assert!(f.gateway.sent()[0].subject.contains("Metformin 500mg"));

    let jobs = f.jobs.for_plan(PLAN).unwrap();
    assert!(jobs[0].is_sent());
    assert!(!jobs[1].is_sent());
    assert!(!jobs[2].is_sent());

    let trail = f.audit.list(record_kind::RENEWAL_SENT, None, 10).unwrap();
    assert_eq!(trail.len(), 1);
    assert!(trail[0].body.contains("due_soon"));
}

#[test]
fn future_jobs_are_never_sent() {
    let f = fixture();
    f.directory.upsert_plan(pickup_plan(10));
    f.inventory.set_stock(PRODUCT, BRANCH, 100);
    schedule(&f, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

    // Still 2024-01-01 00:00 UTC: the first job fires at 21:00 UTC.
    let report = f.dispatch.run_cycle();

    assert_eq!(report.due, 0);
    assert_eq!(f.gateway.sent_count(), 0);
    assert!(f.jobs.for_plan(PLAN).unwrap().iter().all(|j| !j.is_sent()));
}

#[test]
fn sent_jobs_are_never_resent() {
    let f = fixture();
    f.directory.upsert_plan(pickup_plan(10));
    f.inventory.set_stock(PRODUCT, BRANCH, 100);
    schedule(&f, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

    f.clock.set(Utc.with_ymd_and_hms(2024, 1, 1, 21, 5, 0).unwrap());
    f.dispatch.run_cycle();
    let second = f.dispatch.run_cycle();

    assert_eq!(second.due, 0);
    assert_eq!(f.gateway.sent_count(), 1);
}

/// Pickup plan needing 10 with 4 in stock stays pending; after restock a
/// later cycle sends exactly once.
#[test]
fn insufficient_pickup_stock_defers_until_restock() {
    let f = fixture();
    f.directory.upsert_plan(pickup_plan(10));
    f.inventory.set_stock(PRODUCT, BRANCH, 4);
    schedule(&f, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

    f.clock.set(Utc.with_ymd_and_hms(2024, 1, 1, 21, 5, 0).unwrap());
    let starved = f.dispatch.run_cycle();
    assert_eq!(starved.ineligible, 1);
    assert_eq!(f.gateway.sent_count(), 0);

    f.inventory.set_stock(PRODUCT, BRANCH, 12);
    f.clock.advance(chrono::Duration::minutes(30));
    let restocked = f.dispatch.run_cycle();
    assert_eq!(restocked.sent, 1);
    assert_eq!(f.gateway.sent_count(), 1);

    // And never again.
    f.dispatch.run_cycle();
    assert_eq!(f.gateway.sent_count(), 1);
}

#[test]
fn gateway_outage_leaves_job_pending_for_retry() {
    let f = fixture();
    f.directory.upsert_plan(pickup_plan(10));
    f.inventory.set_stock(PRODUCT, BRANCH, 100);
    schedule(&f, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    f.clock.set(Utc.with_ymd_and_hms(2024, 1, 1, 21, 5, 0).unwrap());

    f.gateway.set_failing(true);
    let outage = f.dispatch.run_cycle();
    assert_eq!(outage.failures, 1);
    assert!(!f.jobs.for_plan(PLAN).unwrap()[0].is_sent());

    f.gateway.set_failing(false);
    let recovered = f.dispatch.run_cycle();
    assert_eq!(recovered.sent, 1);
    assert_eq!(f.gateway.sent_count(), 1);
}

#[test]
fn deleted_plan_jobs_are_skipped_not_cancelled() {
    let f = fixture();
    f.directory.upsert_plan(pickup_plan(10));
    f.inventory.set_stock(PRODUCT, BRANCH, 100);
    schedule(&f, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

    f.directory.remove_plan(PLAN);
    f.clock.set(Utc.with_ymd_and_hms(2024, 1, 1, 21, 5, 0).unwrap());

    let report = f.dispatch.run_cycle();
    assert_eq!(report.anomalies, 1);
    assert_eq!(f.gateway.sent_count(), 0);

    // The job lingers and is re-skipped; nothing removes it.
    let again = f.dispatch.run_cycle();
    assert_eq!(again.anomalies, 1);
    assert_eq!(f.jobs.for_plan(PLAN).unwrap().len(), 3);
}

#[test]
fn one_bad_job_does_not_block_the_rest_of_the_batch() {
    let f = fixture();
    // Plan 1 is never registered (anomaly); plan 2 is healthy.
    let other_plan = PlanId::new(2);
    let other_user = UserId::new(8);
    f.directory.set_user_email(other_user, "second@example.com");
    f.directory.upsert_plan(RenewalPlan {
        id: other_plan,
        user_id: other_user,
        ..pickup_plan(10)
    });
    f.inventory.set_stock(PRODUCT, BRANCH, 100);

    let scheduler = EngineConfig::default().scheduler(f.jobs.clone());
    let creation = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    scheduler.schedule_for_plan(PLAN, USER, creation).unwrap();
    scheduler.schedule_for_plan(other_plan, other_user, creation).unwrap();

    f.clock.set(Utc.with_ymd_and_hms(2024, 1, 1, 21, 5, 0).unwrap());
    let report = f.dispatch.run_cycle();

    assert_eq!(report.due, 2);
    assert_eq!(report.anomalies, 1);
    assert_eq!(report.sent, 1);
    assert_eq!(f.gateway.sent()[0].to, "second@example.com");
}

#[test]
fn reminder_stage_sends_despite_empty_shelves() {
    let f = fixture();
    f.directory.upsert_plan(pickup_plan(10));
    // No stock at all.
    schedule(&f, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

    // Local 2024-01-28 00:05 → 2024-01-27 21:05 UTC. The day-1 DueSoon job
    // is also due but starved, so only the reminder goes out.
    f.clock.set(Utc.with_ymd_and_hms(2024, 1, 27, 21, 5, 0).unwrap());
    let report = f.dispatch.run_cycle();

    assert_eq!(report.due, 2);
    assert_eq!(report.ineligible, 1);
    assert_eq!(report.sent, 1);

    let jobs = f.jobs.for_plan(PLAN).unwrap();
    let reminder = jobs
        .iter()
        .find(|j| j.stage == NotificationStage::Reminder)
        .unwrap();
    assert!(reminder.is_sent());
}
