#[cfg(test)]
mod tests {
    use promissory::{all, race, Promise, Reason, Status};
    use std::{thread, time::Duration};

    #[test]
    fn test_resolve_then_chain() {
        let promise = Promise::new(|settler| settler.resolve(42));
        assert_eq!(promise.wait().unwrap(), 42);

        let bumped = promise.then(|v| v + 1);
        assert_eq!(bumped.wait().unwrap(), 43);
    }

    #[test]
    fn test_rejection_recovery() {
        let failure = Reason::msg("Promise Error");
        let promise: Promise<&str> = Promise::new({
            let failure = failure.clone();
            move |settler| settler.reject(failure)
        });

        let recovered = promise.catch(|_| "recovered");
        assert_eq!(recovered.wait().unwrap(), "recovered");

        // The source promise still reports its own rejection.
        assert!(promise.wait().unwrap_err().same(&failure));
        assert_eq!(promise.status(), Status::Rejected);
    }

    #[test]
    fn test_slow_resolution_from_another_thread() {
        let promise = Promise::new(|settler| {
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(100));
                settler.resolve(42);
            });
        });
        assert_eq!(promise.wait().unwrap(), 42);
    }

    #[test]
    fn test_panic_payloads() {
        let p1: Promise<i32> = Promise::new(|_| panic!("random error"));
        assert_eq!(p1.wait().unwrap_err().to_string(), "random error");

        let original = Reason::msg("Promise Error");
        let payload = original.clone();
        let p2: Promise<i32> = Promise::new(move |_| std::panic::panic_any(payload));
        assert!(p2.wait().unwrap_err().same(&original));
    }

    #[test]
    fn test_all_feeding_a_chain() {
        let promises = (1..=3u64).map(|i| {
            Promise::new(move |settler| {
                thread::sleep(Duration::from_millis(10 * (4 - i)));
                settler.resolve(i as i32);
            })
        });
        let summed = all(promises)
            .unwrap()
            .then(|values| values.iter().sum::<i32>());
        assert_eq!(summed.wait().unwrap(), 6);
    }

    #[test]
    fn test_race_across_staggered_promises() {
        let slow = Promise::new(|settler| {
            thread::sleep(Duration::from_millis(200));
            settler.resolve("slow");
        });
        let fast = Promise::new(|settler| {
            thread::sleep(Duration::from_millis(20));
            settler.resolve("fast");
        });
        let winner = race([slow, fast]).unwrap();
        assert_eq!(winner.wait().unwrap(), "fast");
    }

    #[test]
    fn test_await_from_async_code() {
        use futures::executor::block_on;

        let promise = Promise::new(|settler| {
            thread::sleep(Duration::from_millis(50));
            settler.resolve(String::from("🍓"));
        });

        let waiter = thread::spawn({
            let promise = promise.clone();
            move || block_on(async move { promise.await })
        });
        assert_eq!(waiter.join().unwrap().unwrap(), "🍓");
        assert_eq!(promise.wait().unwrap(), "🍓");
    }
}
