use crate::infra::{InMemoryFormRepository, RecordingMailTransport};
use chrono::{Datelike, Local, NaiveDate};
use clap::Args;
use std::sync::Arc;

use housing_forms::config::AppConfig;
use housing_forms::error::AppError;
use housing_forms::workflows::mcr::{
    days_in_month, prorated_amount, ApproverAllowList, FormStatus, LandlordIdentity,
    McrFormService, McrSubmission, McrType, NotificationDispatcher, ProgramType, RequestType,
    Submitter, UnitAddress, VerificationFlags,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// HAP amount for the sample submission (defaults to 1240.00)
    #[arg(long)]
    pub(crate) hap_amount: Option<f64>,
    /// Intended vacate date (YYYY-MM-DD). Defaults to the 15th of this month.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) vacate_date: Option<NaiveDate>,
    /// Identity to approve with. Defaults to the first configured approver.
    #[arg(long)]
    pub(crate) approver: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct ProrateArgs {
    /// Monthly HAP amount to prorate
    #[arg(long)]
    pub(crate) hap_amount: f64,
    /// Intended vacate date (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) vacate_date: NaiveDate,
}

pub(crate) fn run_prorate(args: ProrateArgs) -> Result<(), AppError> {
    let ProrateArgs {
        hap_amount,
        vacate_date,
    } = args;

    match prorated_amount(Some(hap_amount), Some(vacate_date)) {
        Some(amount) => {
            let days = days_in_month(vacate_date);
            println!(
                "{:.2} over {} days, paid through day {}: {:.2}",
                hap_amount,
                days,
                vacate_date.day(),
                amount
            );
        }
        None => println!("No proration: amount must be a non-negative finite number"),
    }

    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        hap_amount,
        vacate_date,
        approver,
    } = args;

    let config = AppConfig::load()?;
    let hap_amount = hap_amount.unwrap_or(1240.0);
    let vacate_date = vacate_date.unwrap_or_else(|| {
        Local::now()
            .date_naive()
            .with_day(15)
            .unwrap_or_else(|| Local::now().date_naive())
    });
    let approver = approver.unwrap_or_else(|| {
        config
            .approvals
            .approvers
            .first()
            .cloned()
            .unwrap_or_else(|| "justin.grier".to_string())
    });

    println!("Manual check request demo");
    println!(
        "Approvers on file: {}",
        config.approvals.approvers.join(", ")
    );

    let repository = Arc::new(InMemoryFormRepository::default());
    let transport = Arc::new(RecordingMailTransport::default());
    let dispatcher = NotificationDispatcher::new(
        transport.clone(),
        config.mail.approver_inbox.clone(),
        config.mail.delivery_timeout(),
    );
    let service = Arc::new(McrFormService::new(
        repository,
        dispatcher,
        ApproverAllowList::new(&config.approvals.approvers),
    ));

    let form = match service.submit(demo_submission(hap_amount, vacate_date)).await {
        Ok(form) => form,
        Err(err) => {
            println!("  Submission rejected: {err}");
            return Ok(());
        }
    };
    println!(
        "\n- Submitted form {} for {} -> status {}",
        form.id.0,
        form.fields.tenant_name,
        form.status.label()
    );
    match form.prorated_amount {
        Some(amount) => println!(
            "  Prorated HAP: {:.2} ({:.2} monthly, vacating {})",
            amount, hap_amount, vacate_date
        ),
        None => println!("  Prorated HAP: not applicable"),
    }

    match service
        .decide(form.id, FormStatus::Approved, Some("front.desk"), None)
        .await
    {
        Err(err) => println!("- Decision by 'front.desk' refused: {err}"),
        Ok(_) => println!("- Decision by 'front.desk' unexpectedly accepted"),
    }

    match service
        .decide(
            form.id,
            FormStatus::Approved,
            Some(approver.as_str()),
            Some("Verified against the owner ledger"),
        )
        .await
    {
        Ok(decided) => println!(
            "- Decision by '{}' accepted -> status {}",
            approver,
            decided.status.label()
        ),
        Err(err) => println!("- Decision by '{approver}' failed: {err}"),
    }

    let messages = transport.messages();
    if messages.is_empty() {
        println!("\nNotifications: none dispatched");
    } else {
        println!("\nNotifications dispatched:");
        for message in messages {
            println!("- to {} | {}", message.to, message.subject);
        }
    }

    Ok(())
}

fn demo_submission(hap_amount: f64, vacate_date: NaiveDate) -> McrSubmission {
    let first_of_month = vacate_date.with_day(1).unwrap_or(vacate_date);

    McrSubmission {
        submitter: Submitter {
            name: "Dana Reyes".to_string(),
            email: "dana.reyes@housing.example.gov".to_string(),
        },
        program_type: ProgramType::Hcv,
        last_four_ssn: "7788".to_string(),
        tenant_name: "Casey Tran".to_string(),
        owner_account_number: "OA-2201".to_string(),
        address: UnitAddress {
            line1: "88 Georgia St".to_string(),
            line2: None,
            city: "Vallejo".to_string(),
            state: "CA".to_string(),
            zip: "94591".to_string(),
        },
        landlord: LandlordIdentity {
            entity_name: Some("Georgia Street Holdings".to_string()),
            first_name: None,
            last_name: None,
        },
        effective_date: first_of_month,
        payment_start: first_of_month,
        payment_end: vacate_date,
        reason_comments: Some("Tenant is vacating mid-month".to_string()),
        mcr_type: McrType::HapPortion,
        verifications: VerificationFlags::default(),
        request_type: RequestType::Move,
        description: None,
        hap_amount,
        date_intended_to_vacate: Some(vacate_date),
        signature_data: None,
    }
}
