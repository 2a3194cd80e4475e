use super::{ResourceScenario, Scenario, ScenarioData, TaskScenario};
use crate::models::Interval;
use crate::property::{AttributeDefinition, AttributeKind, AttributeValue, PropertyKind, PropertySet};

/// Read-only view of the project data cost computations need.
#[derive(Debug, Clone, Copy)]
pub struct CostContext<'a> {
    pub accounts: &'a PropertySet<AccountScenario>,
    pub tasks: &'a PropertySet<TaskScenario>,
    pub resources: &'a PropertySet<ResourceScenario>,
    /// Working seconds in one day; daily rates are divided by it.
    pub daily_working_seconds: f64,
}

/// Scenario state of an account.
#[derive(Debug, Clone)]
pub struct AccountScenario {
    data: ScenarioData,
}

impl Scenario for AccountScenario {
    const KIND: PropertyKind = PropertyKind::Account;

    fn new(data: ScenarioData) -> Self {
        Self { data }
    }

    fn definitions() -> Vec<AttributeDefinition> {
        vec![AttributeDefinition::new("alert", "Alert", AttributeKind::Integer)
            .global()
            .with_default(AttributeValue::Integer(0))]
    }

    fn data(&self) -> &ScenarioData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut ScenarioData {
        &mut self.data
    }
}

impl AccountScenario {
    /// Amount credited to this account within `period`.
    ///
    /// A container account sums the turnover of its children; a leaf
    /// account sums the contribution of every task.
    pub fn turnover(&self, period: &Interval, ctx: &CostContext<'_>) -> f64 {
        let own = self.data.property();
        let scenario = self.data.scenario_idx();
        let Some(node) = ctx.accounts.get(own) else {
            return 0.0;
        };

        if node.is_container() {
            node.children()
                .iter()
                .map(|&c| ctx.accounts[c].scenario(scenario).turnover(period, ctx))
                .sum()
        } else {
            ctx.tasks
                .iter()
                .map(|t| t.scenario(scenario).turnover(own, period, ctx))
                .sum()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Duration;
    use crate::scenario::{Charge, ChargeShare};

    const HOUR: Duration = 3600;

    struct Fixture {
        accounts: PropertySet<AccountScenario>,
        tasks: PropertySet<TaskScenario>,
        resources: PropertySet<ResourceScenario>,
    }

    impl Fixture {
        fn ctx(&self) -> CostContext<'_> {
            CostContext {
                accounts: &self.accounts,
                tasks: &self.tasks,
                resources: &self.resources,
                daily_working_seconds: 8.0 * 3600.0,
            }
        }
    }

    fn fixture() -> Fixture {
        let mut accounts: PropertySet<AccountScenario> = PropertySet::new(1);
        let cost = accounts.add("cost", "Cost", None).unwrap();
        let dev = accounts.add("dev", "Development", Some(cost)).unwrap();
        let qa = accounts.add("qa", "QA", Some(cost)).unwrap();

        let mut resources: PropertySet<ResourceScenario> = PropertySet::new(1);
        let r = resources.add("dev1", "Developer", None).unwrap();
        resources
            .set_attribute(r, "rate", Some(0), AttributeValue::Number(400.0))
            .unwrap();

        let mut tasks: PropertySet<TaskScenario> = PropertySet::new(1);
        let prj = tasks.add("prj", "Project", None).unwrap();
        let t1 = tasks.add("t1", "Implement", Some(prj)).unwrap();
        let t2 = tasks.add("t2", "Test", Some(prj)).unwrap();
        tasks[prj].scenario_mut(0).chargeset.push(ChargeShare {
            account: dev,
            share: 1.0,
        });
        {
            let s = tasks[t1].scenario_mut(0);
            s.book(r, Interval::new(9 * HOUR, 17 * HOUR).unwrap()).unwrap();
        }
        {
            let s = tasks[t2].scenario_mut(0);
            s.chargeset.push(ChargeShare { account: qa, share: 0.5 });
            s.charges.push(Charge {
                amount: 100.0,
                at: 20 * HOUR,
            });
        }

        Fixture {
            accounts,
            tasks,
            resources,
        }
    }

    #[test]
    fn test_leaf_account_turnover() {
        let f = fixture();
        let ctx = f.ctx();
        let day = Interval::new(0, 24 * HOUR).unwrap();

        // Eight booked hours at 400 per eight-hour day, inherited chargeset.
        assert_eq!(f.accounts[1].scenario(0).turnover(&day, &ctx), 400.0);
        // Half of the fixed charge.
        assert_eq!(f.accounts[2].scenario(0).turnover(&day, &ctx), 50.0);
    }

    #[test]
    fn test_container_sums_children() {
        let f = fixture();
        let ctx = f.ctx();
        let day = Interval::new(0, 24 * HOUR).unwrap();
        assert_eq!(f.accounts[0].scenario(0).turnover(&day, &ctx), 450.0);

        let morning = Interval::new(0, 13 * HOUR).unwrap();
        assert_eq!(f.accounts[0].scenario(0).turnover(&morning, &ctx), 200.0);
    }
}
