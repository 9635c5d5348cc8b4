use bounded_checkout::{
    BoundedCheckoutExecutor, CheckoutError, CheckoutOptions, CheckoutRequest, SimulatedGateway,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let options = CheckoutOptions::from_env().map_err(anyhow::Error::msg)?;
    let executor = BoundedCheckoutExecutor::new(SimulatedGateway::new()).with_options(options);

    match executor.execute(CheckoutRequest::new(100.0)).await {
        Ok(receipt) => println!(
            "checkout {} after {:?} ({} attempt(s))",
            receipt.status, receipt.elapsed, receipt.attempts
        ),
        Err(err @ CheckoutError::Timeout { .. }) => println!("checkout failed: {err}"),
        Err(err) => return Err(err.into()),
    }

    Ok(())
}
