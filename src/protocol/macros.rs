/// Generates a typed read/write accessor pair for one register width.
macro_rules! impl_typed_access {
    ($type:ty, $width:ident) => {
        paste::paste! {
            #[doc = "Reads a `" $type "` register at `address`."]
            #[inline]
            fn [<read_ $type>](&mut self, address: u32) -> $crate::error::Result<$type> {
                let value = self.read(address, $crate::protocol::AccessWidth::$width)?;
                Ok(value as $type)
            }

            #[doc = "Writes a `" $type "` register at `address`."]
            #[inline]
            fn [<write_ $type>](&mut self, address: u32, value: $type) -> $crate::error::Result<()> {
                self.write(address, $crate::protocol::AccessWidth::$width, value as u32)
            }
        }
    };
}

pub(super) use impl_typed_access;
