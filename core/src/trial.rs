//! The trial runner: one seeded path through the studio's horizon.
//!
//! MONTH ORDER (fixed, never reordered):
//!   1. Members        churn, acquisition, last month's conversions
//!   2. Demand         program demand drawn against this month's members
//!   3. Capacity       member hours first, then programs by throttle policy
//!   4. Revenue        membership dues plus realized program attendance
//!   5. Expenses       fixed (escalated, shocked), variable, program costs
//!   6. Debt service   scheduled payments summed across loans
//!   7. Cash           NOI, DSCR, net cash flow, cumulative cash
//!
//! RULES:
//!   - Each model draws only from its own stream slot.
//!   - A trial touches no shared mutable state, so trials run in any
//!     order on any thread and still reproduce bit for bit.
//!   - Conversions realized in the final month join no one.

use crate::{
    capacity::CapacityModel,
    config::ParameterSet,
    error::{ConfigError, TrialError},
    expenses::ExpenseModel,
    loan::{dscr, DebtSchedule},
    members::MemberDynamics,
    revenue::RevenueModel,
    rng::{trial_seed, TrialStreams},
    statement::{MonthlyStatement, TrialResult},
    types::{Month, TrialIndex},
};

/// Everything a trial needs that does not change between trials.
pub struct TrialRunner<'a> {
    params:   &'a ParameterSet,
    capacity: CapacityModel,
    revenue:  RevenueModel<'a>,
    expenses: ExpenseModel<'a>,
    debt:     DebtSchedule,
}

impl<'a> TrialRunner<'a> {
    pub fn new(params: &'a ParameterSet) -> Result<Self, ConfigError> {
        let capacity = CapacityModel::new(params.studio());
        let revenue = RevenueModel::new(params, &capacity)?;
        Ok(Self {
            params,
            revenue,
            capacity,
            expenses: ExpenseModel::new(params.expenses()),
            debt:     DebtSchedule::from_params(params)?,
        })
    }

    pub fn params(&self) -> &ParameterSet {
        self.params
    }

    pub fn debt(&self) -> &DebtSchedule {
        &self.debt
    }

    /// Run trial `trial_index` from its derived seed.
    pub fn run(&self, trial_index: TrialIndex) -> Result<TrialResult, TrialError> {
        let seed = trial_seed(self.params.seed(), trial_index);
        let mut streams = TrialStreams::new(seed);
        let archetypes = self.params.archetypes();
        let seasonality = self.params.seasonality();
        let horizon = self.params.horizon();

        let mut members = MemberDynamics::new(archetypes, self.params.studio().max_members);
        let mut pending_conversions = vec![0u64; archetypes.len()];
        let mut cash = self.params.simulation().starting_cash;
        let mut statements = Vec::with_capacity(horizon as usize);

        for month in 1..=horizon {
            let member_months = members.step(
                month,
                seasonality.acquisition_multiplier(month),
                &pending_conversions,
                &mut streams.members,
            )?;
            let active = members.active();

            let requests = self.revenue.program_requests(
                active,
                seasonality.demand_multiplier(month),
                &mut streams.demand,
            );
            let member_hours = self.capacity.member_hours(archetypes, active);
            let plan = self.capacity.allocate(&member_hours, &requests);
            let realized = self.revenue.realize(active, &requests, &plan, &mut streams.demand);

            let expenses = self.expenses.month(
                month,
                members.total_active(),
                plan.used_hours(),
                self.revenue.program_costs(&realized.attendance),
                &mut streams.expenses,
            );

            let total_revenue = realized.total();
            let operating_expenses = expenses.total();
            let net_operating_income = total_revenue - operating_expenses;
            let debt_service = self.debt.debt_service(month);
            let net_cash_flow = net_operating_income - debt_service;
            cash += net_cash_flow;

            ensure_finite(month, "total_revenue", total_revenue)?;
            ensure_finite(month, "operating_expenses", operating_expenses)?;
            ensure_finite(month, "cumulative_cash", cash)?;

            log::trace!(
                "trial {trial_index} month {month}: {} members, revenue {total_revenue:.2}, cash {cash:.2}",
                members.total_active()
            );

            pending_conversions = realized.conversions;
            statements.push(MonthlyStatement {
                month,
                members: member_months,
                revenue: realized.by_stream,
                total_revenue,
                attendance: realized.attendance,
                stations: plan.stations,
                expenses,
                operating_expenses,
                net_operating_income,
                debt_service,
                dscr: dscr(net_operating_income, debt_service),
                net_cash_flow,
                cumulative_cash: cash,
            });
        }

        Ok(TrialResult { trial_index, seed, statements })
    }
}

fn ensure_finite(month: Month, field: &'static str, value: f64) -> Result<(), TrialError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TrialError::NonFinite { month, field })
    }
}
