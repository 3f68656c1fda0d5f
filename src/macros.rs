/// Connects (or, if already connected, disconnects — `connect_nodes` is a
/// toggle) one or more port pairs on a flow.
#[macro_export]
macro_rules! connect {
    ($flow:expr; $($start:expr => $end:expr);+ $(;)?) => {
        $(
            $flow.connect_nodes($start, $end);
        )+
    };
}

/// Chains a sequence of ports together: `a => b => c` connects `a -> b` and
/// `b -> c`.
#[macro_export]
macro_rules! connect_all {
    ($flow:expr; $($start:expr $(=> $end:expr)+;)+) => {
        $({
            let mut last = $start;

            $(
                $flow.connect_nodes(last, $end);
                last = $end;
            )+
        })+
    };
}
